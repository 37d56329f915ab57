//! Integration tests: the client library against a real relay.
//!
//! # Purpose
//!
//! These tests start an actual `solocast-relay` on `127.0.0.1:0` and drive
//! it exclusively through [`RelayClient`], the way the console binaries do.
//! They verify:
//!
//! - A broadcaster/viewer pair can exchange payloads in both directions.
//! - A handshake rejection surfaces as the typed
//!   [`ClientError::Rejected`] rather than as an application payload.
//! - A peer disconnect surfaces as [`ClientError::Closed`] on the next
//!   receive only after the relay itself closes — a vacated peer slot alone
//!   does not disturb the survivor.
//!
//! ```text
//! RelayClient (broadcaster) ──┐
//!                             ├── solocast-relay (this process)
//! RelayClient (viewer) ───────┘
//! ```

use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use tokio::time::{sleep, timeout};

use solocast_client::{ClientError, RelayClient};
use solocast_core::{RejectReason, RelayPayload, Role};
use solocast_relay::application::RoleRegistry;
use solocast_relay::domain::RelayConfig;
use solocast_relay::infrastructure::RelayListener;

// ── Test harness ──────────────────────────────────────────────────────────────

/// Starts a relay on an OS-assigned port and returns its signaling URL.
async fn start_relay() -> (String, Arc<AtomicBool>) {
    let config = RelayConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        ..RelayConfig::default()
    };
    let (registry, handle) = RoleRegistry::new();
    tokio::spawn(registry.run());
    let listener = RelayListener::bind(config, handle).await.expect("bind");
    let addr: SocketAddr = listener.local_addr();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(listener.run(Arc::clone(&running)));
    (format!("ws://{addr}/signal"), running)
}

/// Connects a client and lets the relay settle the assignment.
async fn connect(url: &str, role: Role) -> RelayClient {
    let client = RelayClient::connect(url, role).await.expect("connect");
    sleep(Duration::from_millis(50)).await;
    client
}

async fn recv(client: &mut RelayClient) -> Result<RelayPayload, ClientError> {
    timeout(Duration::from_secs(2), client.recv())
        .await
        .expect("timed out waiting for a payload")
}

// ── Pair exchange ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pair_exchanges_payloads_both_ways() {
    // Arrange
    let (url, _running) = start_relay().await;
    let mut broadcaster = connect(&url, Role::Broadcaster).await;
    let mut viewer = connect(&url, Role::Viewer).await;

    // Act / Assert: offer goes broadcaster → viewer...
    broadcaster
        .send(RelayPayload::Text("{\"type\":\"offer\"}".to_owned()))
        .await
        .unwrap();
    assert_eq!(
        recv(&mut viewer).await.unwrap(),
        RelayPayload::Text("{\"type\":\"offer\"}".to_owned())
    );

    // ...and the answer comes back viewer → broadcaster.
    viewer
        .send(RelayPayload::Text("{\"type\":\"answer\"}".to_owned()))
        .await
        .unwrap();
    assert_eq!(
        recv(&mut broadcaster).await.unwrap(),
        RelayPayload::Text("{\"type\":\"answer\"}".to_owned())
    );
}

#[tokio::test]
async fn test_binary_payloads_round_trip() {
    let (url, _running) = start_relay().await;
    let mut broadcaster = connect(&url, Role::Broadcaster).await;
    let mut viewer = connect(&url, Role::Viewer).await;

    broadcaster
        .send(RelayPayload::Binary(vec![0xde, 0xad, 0xbe, 0xef]))
        .await
        .unwrap();
    assert_eq!(
        recv(&mut viewer).await.unwrap(),
        RelayPayload::Binary(vec![0xde, 0xad, 0xbe, 0xef])
    );
}

// ── Typed rejection ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_role_conflict_surfaces_as_typed_rejection() {
    // Arrange: the broadcaster slot is taken.
    let (url, _running) = start_relay().await;
    let _incumbent = connect(&url, Role::Broadcaster).await;

    // Act: a second broadcaster connects; the rejection arrives on recv.
    let mut rejected = RelayClient::connect(&url, Role::Broadcaster)
        .await
        .expect("the websocket itself connects; rejection comes as a message");
    let err = recv(&mut rejected).await.unwrap_err();

    // Assert
    match err {
        ClientError::Rejected(reason) => {
            assert_eq!(reason, RejectReason::RoleTaken(Role::Broadcaster));
        }
        other => panic!("expected a typed rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_reports_its_role() {
    let (url, _running) = start_relay().await;
    let broadcaster = connect(&url, Role::Broadcaster).await;
    let viewer = connect(&url, Role::Viewer).await;
    assert_eq!(broadcaster.role(), Role::Broadcaster);
    assert_eq!(viewer.role(), Role::Viewer);
}

// ── Disconnect behavior ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_peer_disconnect_leaves_survivor_connected() {
    // Arrange: a connected pair.
    let (url, _running) = start_relay().await;
    let broadcaster = connect(&url, Role::Broadcaster).await;
    let mut viewer = connect(&url, Role::Viewer).await;

    // Act: the broadcaster leaves cleanly.
    broadcaster.close().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    // Assert: the viewer is still usable — a successor broadcaster pairs
    // with it immediately.
    let mut successor = connect(&url, Role::Broadcaster).await;
    viewer
        .send(RelayPayload::Text("anyone there?".to_owned()))
        .await
        .unwrap();
    assert_eq!(
        recv(&mut successor).await.unwrap(),
        RelayPayload::Text("anyone there?".to_owned())
    );
}
