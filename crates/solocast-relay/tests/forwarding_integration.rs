//! Integration tests for payload forwarding between a connected pair.
//!
//! # Purpose
//!
//! These tests run a real relay on `127.0.0.1:0` and verify the forwarding
//! contract end to end:
//!
//! - Verbatim delivery: bytes and message kind survive the relay untouched.
//! - Order preservation: a single sender's payloads arrive in send order.
//! - Symmetry: broadcaster→viewer and viewer→broadcaster behave identically.
//! - Drop-when-unpaired: payloads sent into a vacant slot vanish, even if a
//!   peer attaches later (no buffering, no replay).
//! - Slot reclaim: a disconnect vacates the slot for a successor while the
//!   surviving peer stays connected and pairs with the newcomer.
//! - The idle deadline: a silent assigned connection is cut off and its
//!   slot reclaimed.
//!
//! # The forwarding flow
//!
//! ```text
//! Broadcaster                Relay                     Viewer
//! ───────────                ─────                     ──────
//! send "hello"  ──────────►  lookup(Viewer)
//!                            occupant found ─────────► recv "hello"
//! send "lonely" ──────────►  lookup(Viewer)
//!                            slot vacant → dropped     (nothing, ever)
//! ```
//!
//! Payloads here are deliberately shaped like real signaling traffic
//! (`serde_json`-built session descriptions) in some tests — the relay must
//! pass them through without caring.

use std::net::SocketAddr;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use solocast_relay::application::RoleRegistry;
use solocast_relay::domain::RelayConfig;
use solocast_relay::infrastructure::RelayListener;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── Test harness ──────────────────────────────────────────────────────────────

async fn start_relay_with(mut config: RelayConfig) -> (SocketAddr, Arc<AtomicBool>) {
    config.bind_addr = "127.0.0.1:0".parse().unwrap();
    let (registry, handle) = RoleRegistry::new();
    tokio::spawn(registry.run());
    let listener = RelayListener::bind(config, handle).await.expect("bind");
    let addr = listener.local_addr();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(listener.run(Arc::clone(&running)));
    (addr, running)
}

async fn start_relay() -> (SocketAddr, Arc<AtomicBool>) {
    start_relay_with(RelayConfig::default()).await
}

async fn connect_as(addr: SocketAddr, role: &str) -> Client {
    let (mut ws, _) = connect_async(format!("ws://{addr}/signal"))
        .await
        .expect("connect");
    ws.send(Message::Text(role.to_owned())).await.expect("send role");
    // Give the relay a moment to process the assignment so forwarding tests
    // start from a settled registry.
    sleep(Duration::from_millis(50)).await;
    ws
}

async fn recv_text(ws: &mut Client) -> String {
    let frame = timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended unexpectedly")
        .expect("websocket error");
    match frame {
        Message::Text(text) => text,
        other => panic!("expected a text frame, got {other:?}"),
    }
}

/// Asserts that no data frame arrives within `window`.
async fn assert_nothing_received(ws: &mut Client, window: Duration) {
    match timeout(window, ws.next()).await {
        Err(_) => {} // silence, as expected
        Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {} // control noise is fine
        Ok(other) => panic!("expected silence, got {other:?}"),
    }
}

// ── Verbatim delivery (scenario 2) ────────────────────────────────────────────

/// Scenario 2: the viewer receives exactly what the broadcaster sent.
#[tokio::test]
async fn test_broadcaster_payload_reaches_viewer_verbatim() {
    // Arrange
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    // Act
    broadcaster.send(Message::Text("hello".to_owned())).await.unwrap();

    // Assert
    assert_eq!(recv_text(&mut viewer).await, "hello");
}

#[tokio::test]
async fn test_json_signaling_payload_passes_through_unparsed() {
    // A realistic session-description payload; the relay must forward the
    // exact string without ever parsing or normalising the JSON.
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    let offer = json!({
        "type": "offer",
        "sdp": "v=0\r\no=- 46117317 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n"
    })
    .to_string();

    broadcaster.send(Message::Text(offer.clone())).await.unwrap();
    assert_eq!(recv_text(&mut viewer).await, offer);
}

#[tokio::test]
async fn test_binary_payload_stays_binary() {
    // Arrange
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    // Act: send bytes that are not valid UTF-8.
    broadcaster
        .send(Message::Binary(vec![0x00, 0xff, 0xfe, 0x7f]))
        .await
        .unwrap();

    // Assert: same kind, same bytes.
    let frame = timeout(Duration::from_secs(2), viewer.next())
        .await
        .expect("timed out")
        .expect("stream ended")
        .expect("websocket error");
    assert_eq!(frame, Message::Binary(vec![0x00, 0xff, 0xfe, 0x7f]));
}

// ── Symmetry ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_forwarding_works_in_both_directions() {
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    broadcaster.send(Message::Text("offer".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut viewer).await, "offer");

    viewer.send(Message::Text("answer".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut broadcaster).await, "answer");
}

// ── Order preservation ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_single_sender_order_is_preserved() {
    // Arrange
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    // Act: a burst of numbered payloads from one sender.
    for n in 0..32 {
        broadcaster
            .send(Message::Text(format!("candidate-{n}")))
            .await
            .unwrap();
    }

    // Assert: they arrive in exactly the order sent.
    for n in 0..32 {
        assert_eq!(
            recv_text(&mut viewer).await,
            format!("candidate-{n}"),
            "payload {n} arrived out of order"
        );
    }
}

// ── Drop-when-unpaired (scenario 3) ───────────────────────────────────────────

/// Scenario 3: a payload sent into a vacant slot is gone forever — a viewer
/// attaching later receives nothing retroactively.
#[tokio::test]
async fn test_unpaired_payload_is_dropped_not_buffered() {
    // Arrange: only a broadcaster.
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;

    // Act: send into the void, then let a viewer attach.
    broadcaster.send(Message::Text("lonely".to_owned())).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    let mut viewer = connect_as(addr, "viewer").await;

    // Assert: the late viewer never sees the earlier payload...
    assert_nothing_received(&mut viewer, Duration::from_millis(300)).await;

    // ...but live traffic flows immediately.
    broadcaster.send(Message::Text("fresh".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut viewer).await, "fresh");
}

// ── Slot reclaim (scenario 4) ─────────────────────────────────────────────────

/// Scenario 4: a broadcaster disconnect vacates its slot; the viewer stays
/// connected and pairs with the successor.
#[tokio::test]
async fn test_disconnect_vacates_slot_and_peer_survives() {
    // Arrange: a connected pair.
    let (addr, _running) = start_relay().await;
    let broadcaster = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;

    // Act: the broadcaster's transport closes.
    drop(broadcaster);
    sleep(Duration::from_millis(200)).await;

    // Assert: a successor claims the vacated slot without a conflict...
    let mut successor = connect_as(addr, "broadcaster").await;

    // ...the surviving viewer can reach the successor...
    viewer.send(Message::Text("still here".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut successor).await, "still here");

    // ...and the successor can reach the viewer.
    successor.send(Message::Text("round two".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut viewer).await, "round two");
}

/// A write failure on one connection's socket terminates that connection
/// only: when the viewer's transport dies abruptly mid-stream, the sending
/// broadcaster stays connected and pairs with a successor.
#[tokio::test]
async fn test_sender_survives_peer_transport_failure_mid_stream() {
    // Arrange: a connected pair.
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let viewer = connect_as(addr, "viewer").await;

    // Act: the viewer's transport dies outright (no Close frame) while the
    // broadcaster keeps sending. The failing writes belong to the viewer's
    // connection, so only the viewer's session may die.
    drop(viewer);
    for n in 0..10 {
        broadcaster
            .send(Message::Text(format!("in-flight-{n}")))
            .await
            .expect("the sender must stay open while its peer's socket fails");
        sleep(Duration::from_millis(20)).await;
    }

    // Assert: the dead viewer's slot was vacated, a successor claims it,
    // and the surviving broadcaster reaches the successor with fresh
    // traffic (the in-flight payloads are gone, not replayed).
    let mut successor = connect_as(addr, "viewer").await;
    assert_nothing_received(&mut successor, Duration::from_millis(200)).await;
    broadcaster.send(Message::Text("fresh start".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut successor).await, "fresh start");

    // And the pairing is fully bidirectional again.
    successor.send(Message::Text("ack".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut broadcaster).await, "ack");
}

#[tokio::test]
async fn test_viewer_disconnect_reclaims_viewer_slot() {
    // The mirror image of scenario 4.
    let (addr, _running) = start_relay().await;
    let mut broadcaster = connect_as(addr, "broadcaster").await;
    let viewer = connect_as(addr, "viewer").await;

    drop(viewer);
    sleep(Duration::from_millis(200)).await;

    let mut successor = connect_as(addr, "viewer").await;
    broadcaster.send(Message::Text("welcome back".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut successor).await, "welcome back");
}

// ── Idle deadline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_idle_deadline_releases_the_slot() {
    // Arrange: a short idle deadline so the test stays fast.
    let (addr, _running) = start_relay_with(RelayConfig {
        idle_timeout: Some(Duration::from_millis(300)),
        ..RelayConfig::default()
    })
    .await;

    // Act: a broadcaster connects and then goes silent.
    let mut idle = connect_as(addr, "broadcaster").await;

    // Assert: the relay eventually closes the idle connection...
    let closed = timeout(Duration::from_secs(2), idle.next()).await.expect("timed out");
    match closed {
        None | Some(Ok(Message::Close(_))) => {}
        Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {}
        other => panic!("expected the idle connection to close, got {other:?}"),
    }
    sleep(Duration::from_millis(100)).await;

    // ...and its slot is claimable again.
    let mut successor = connect_as(addr, "broadcaster").await;
    let mut viewer = connect_as(addr, "viewer").await;
    successor.send(Message::Text("awake".to_owned())).await.unwrap();
    assert_eq!(recv_text(&mut viewer).await, "awake");
}
