//! Per-connection session lifecycle: handshake, receive loop, cleanup.
//!
//! Each accepted TCP connection gets one Tokio task running this module's
//! [`handle_connection`]. The task drives the connection through its whole
//! life:
//!
//! 1. **Upgrade** — complete the WebSocket handshake, refusing wrong paths
//!    (404) and disallowed origins (403) inside the upgrade callback.
//! 2. **Role handshake** — the first data frame must be the literal token
//!    `broadcaster` or `viewer`. Anything else is answered with
//!    `error: unknown role` and a close, with no registry interaction.
//! 3. **Assignment** — claim the role's slot. An occupied slot is answered
//!    with `error: <role> already exists` and a close; the incumbent is
//!    untouched.
//! 4. **Receive loop** — forward every data frame to the opposite role via
//!    the router, in receive order.
//! 5. **Cleanup** — on *every* exit path: release the slot (matched against
//!    this connection's id, so a newer occupant is never evicted), then
//!    close the socket.
//!
//! # The writer task
//!
//! Outbound traffic does not go through this task's loop. Each session owns
//! a private bounded queue drained by its own writer task, which owns the
//! socket's sink half. That gives two properties the relay depends on:
//!
//! - A peer forwarding to us only touches our in-memory queue, so the
//!   registry is never held hostage by our socket.
//! - A write failure surfaces *here*, in the owning session, which then
//!   releases its slot and dies — the sender whose payload was lost stays
//!   connected, because the fault was ours, not theirs.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};
use tracing::{debug, info, warn};

use solocast_core::{ConnectionId, RejectReason, RelayPayload, Role};

use crate::application::{PeerHandle, RegistryClosed, RegistryHandle, RelayRouter};
use crate::domain::RelayConfig;
use crate::infrastructure::ws_server::{check_upgrade_request, log_refusal};

/// Capacity of a session's private outbound queue.
///
/// This is transport plumbing for an attached pair, not replay storage: a
/// signaling exchange is a handful of small messages, and the queue dies
/// with its connection. A full queue applies backpressure to the sender.
const OUTBOUND_BUFFER: usize = 32;

/// How long cleanup waits for the writer to flush and send its Close frame.
const WRITER_DRAIN: Duration = Duration::from_secs(1);

type WsSink = SplitSink<WebSocketStream<TcpStream>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

// ── Error taxonomy ────────────────────────────────────────────────────────────

/// Everything that can end a session other than a clean close.
///
/// Each variant maps onto one class of the relay's error taxonomy: upgrade
/// and pre-role failures are handshake errors, `UnknownRole`/`RoleConflict`
/// are explicit rejections, and the rest terminate an assigned connection
/// through the ordinary cleanup path.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The WebSocket upgrade failed or was refused by policy.
    #[error("WebSocket upgrade failed: {0}")]
    Upgrade(WsError),

    /// The transport closed before a role token arrived.
    #[error("connection closed before a role was declared")]
    HandshakeClosed,

    /// A receive failed before a role token arrived.
    #[error("receive failed during role handshake: {0}")]
    Handshake(WsError),

    /// The handshake deadline expired with no role token.
    #[error("no role declared within the handshake deadline")]
    HandshakeTimeout,

    /// The first message was not a recognized role token.
    #[error("unknown role token {token:?}")]
    UnknownRole { token: String },

    /// The requested role's slot is already occupied.
    #[error("{role} slot is already occupied")]
    RoleConflict { role: Role },

    /// A receive failed after the role was assigned.
    #[error("receive failed: {0}")]
    Receive(WsError),

    /// The idle deadline expired for an assigned connection.
    #[error("no activity within the idle deadline")]
    IdleTimeout,

    /// Writing to this connection's own socket failed.
    #[error("outbound write failed: {0}")]
    Forward(WsError),

    /// The outbound writer task ended while the session was still running.
    #[error("outbound writer stopped unexpectedly")]
    WriterStopped,

    /// The registry task is gone; the relay is shutting down.
    #[error(transparent)]
    Registry(#[from] RegistryClosed),
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Top-level handler for one connection's session task.
///
/// Wraps [`run_session`] and logs the outcome. Rejections and clean closes
/// are ordinary relay life (info); transport failures get a warning.
pub async fn handle_connection(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    registry: RegistryHandle,
) {
    match run_session(raw_stream, peer_addr, config, registry).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) if is_routine_end(&e) => info!("session {peer_addr} ended: {e}"),
        Err(e) => warn!("session {peer_addr} closed with error: {e}"),
    }
}

/// True for session endings that are ordinary relay life, not faults.
///
/// Covers explicit rejections, handshake/idle deadline expiries, and refused
/// upgrades. A refused upgrade was already logged at warn level by the
/// admission callback, so the outcome line stays at info to avoid a second
/// warning for the same request.
fn is_routine_end(error: &SessionError) -> bool {
    matches!(
        error,
        SessionError::Upgrade(_)
            | SessionError::UnknownRole { .. }
            | SessionError::RoleConflict { .. }
            | SessionError::HandshakeClosed
            | SessionError::HandshakeTimeout
            | SessionError::IdleTimeout
    )
}

/// Runs the complete lifecycle of a single connection.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<RelayConfig>,
    registry: RegistryHandle,
) -> Result<(), SessionError> {
    // ── Step 1: WebSocket upgrade with admission policy ───────────────────────
    //
    // The callback runs while the HTTP request is still in hand, which is
    // the only moment the relay can answer with a proper status code instead
    // of a WebSocket close.
    let policy_config = Arc::clone(&config);
    let ws_stream = accept_hdr_async(raw_stream, move |request: &Request, response: Response| {
        let origin = request
            .headers()
            .get("Origin")
            .and_then(|value| value.to_str().ok());
        match check_upgrade_request(request.uri().path(), origin, &policy_config) {
            Ok(()) => Ok(response),
            Err(refusal) => {
                log_refusal(peer_addr, &refusal);
                let mut refused = ErrorResponse::new(Some(refusal.to_string()));
                *refused.status_mut() = refusal.status();
                Err(refused)
            }
        }
    })
    .await
    .map_err(SessionError::Upgrade)?;

    let conn_id = ConnectionId::new();
    debug!("session {peer_addr} upgraded as connection {conn_id}");

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // ── Step 2: Role handshake ────────────────────────────────────────────────
    let handshake = read_role_token(&mut ws_rx, config.handshake_timeout).await?;

    let role = match Role::from_token(&handshake) {
        Ok(role) => role,
        Err(unknown) => {
            reject(&mut ws_tx, RejectReason::UnknownRole).await;
            return Err(SessionError::UnknownRole {
                token: unknown.token,
            });
        }
    };

    // ── Step 3: Claim the role's slot ─────────────────────────────────────────
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
    let peer_handle = PeerHandle {
        conn_id,
        outbound: outbound_tx.clone(),
    };

    if !registry.try_assign(role, peer_handle).await? {
        reject(&mut ws_tx, RejectReason::RoleTaken(role)).await;
        return Err(SessionError::RoleConflict { role });
    }

    info!("session {peer_addr} assigned role {role} as connection {conn_id}");

    // ── Step 4: Receive loop, with the writer draining our outbound queue ────
    let mut writer = spawn_writer(ws_tx, outbound_rx);
    let router = RelayRouter::new(registry.clone());

    let outcome = relay_loop(&mut ws_rx, &mut writer, &router, role, config.idle_timeout).await;

    // ── Step 5: Unconditional cleanup ─────────────────────────────────────────
    //
    // Runs on every exit path: vacate the slot first (so a reconnecting
    // client can claim it immediately), then close the socket. The release
    // is matched against our connection id inside the registry, so even a
    // late cleanup can never evict a newer occupant.
    if registry.release(role, conn_id).await.is_err() {
        debug!("registry gone while releasing {role} slot for {conn_id}");
    }
    drop(outbound_tx);
    if !writer.is_finished() {
        // Let the writer flush queued payloads and send its Close frame.
        let _ = timeout(WRITER_DRAIN, &mut writer).await;
    }
    writer.abort();

    debug!("session {peer_addr} released {role} slot for connection {conn_id}");
    outcome
}

// ── Handshake ─────────────────────────────────────────────────────────────────

/// Reads the first *data* frame, which must carry the role token.
///
/// Control frames (ping/pong) before the token are tolerated and skipped; a
/// text or binary frame is returned as raw bytes for exact matching. The
/// whole wait is bounded by the configured handshake deadline, if any.
async fn read_role_token(
    ws_rx: &mut WsSource,
    deadline: Option<Duration>,
) -> Result<Vec<u8>, SessionError> {
    let token = async {
        loop {
            match ws_rx.next().await {
                Some(Ok(WsMessage::Text(text))) => return Ok(text.into_bytes()),
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(bytes),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    // Not a handshake; keep waiting for the first data frame.
                }
                Some(Ok(WsMessage::Close(_))) => return Err(SessionError::HandshakeClosed),
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    return Err(SessionError::HandshakeClosed)
                }
                Some(Err(e)) => return Err(SessionError::Handshake(e)),
                None => return Err(SessionError::HandshakeClosed),
            }
        }
    };

    match deadline {
        Some(limit) => timeout(limit, token)
            .await
            .map_err(|_| SessionError::HandshakeTimeout)?,
        None => token.await,
    }
}

/// Sends a rejection text and closes the connection.
///
/// Failures are ignored: the client may already be gone, and the session is
/// terminating either way.
async fn reject(ws_tx: &mut WsSink, reason: RejectReason) {
    let _ = ws_tx.send(WsMessage::Text(reason.message().to_owned())).await;
    let _ = ws_tx.close().await;
}

// ── Receive loop ──────────────────────────────────────────────────────────────

/// Forwards inbound data frames until the connection ends.
///
/// Also watches the writer task: if our own socket's sink fails, the session
/// must die even though reads might still succeed for a while.
async fn relay_loop(
    ws_rx: &mut WsSource,
    writer: &mut JoinHandle<Result<(), WsError>>,
    router: &RelayRouter,
    role: Role,
    idle_deadline: Option<Duration>,
) -> Result<(), SessionError> {
    loop {
        let next = tokio::select! {
            joined = &mut *writer => {
                return Err(match joined {
                    Ok(Err(e)) => SessionError::Forward(e),
                    // The writer only returns Ok after its queue closes,
                    // which cannot happen while this loop holds a sender.
                    Ok(Ok(())) | Err(_) => SessionError::WriterStopped,
                });
            }
            next = receive_next(ws_rx, idle_deadline) => next?,
        };

        let payload = match next {
            Some(Ok(WsMessage::Text(text))) => RelayPayload::Text(text),
            Some(Ok(WsMessage::Binary(bytes))) => RelayPayload::Binary(bytes),
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                // Transport-level frames are never relayed.
                continue;
            }
            Some(Ok(WsMessage::Close(_))) => {
                debug!("{role} sent a Close frame");
                return Ok(());
            }
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("{role} connection closed");
                return Ok(());
            }
            Some(Err(e)) => return Err(SessionError::Receive(e)),
            None => {
                debug!("{role} stream ended");
                return Ok(());
            }
        };

        // Forward synchronously so per-sender order is preserved end to end.
        let outcome = router.forward(role, payload).await?;
        debug!("{role} payload forwarded: {outcome:?}");
    }
}

/// One receive, bounded by the idle deadline when one is configured.
async fn receive_next(
    ws_rx: &mut WsSource,
    idle_deadline: Option<Duration>,
) -> Result<Option<Result<WsMessage, WsError>>, SessionError> {
    match idle_deadline {
        Some(limit) => timeout(limit, ws_rx.next())
            .await
            .map_err(|_| SessionError::IdleTimeout),
        None => Ok(ws_rx.next().await),
    }
}

// ── Writer task ───────────────────────────────────────────────────────────────

/// Spawns the task that owns this connection's sink half.
///
/// Drains the outbound queue into the socket; when the queue closes (session
/// cleanup dropped the last sender) it sends a Close frame and ends. A write
/// error ends the task immediately and is reported to the session's receive
/// loop through the join handle.
fn spawn_writer(
    mut ws_tx: WsSink,
    mut outbound_rx: mpsc::Receiver<RelayPayload>,
) -> JoinHandle<Result<(), WsError>> {
    tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            ws_tx.send(payload_to_frame(payload)).await?;
        }
        // Queue closed: the session is over; say goodbye to the client.
        let _ = ws_tx.close().await;
        Ok(())
    })
}

// ── Payload ⇄ frame conversion ────────────────────────────────────────────────

/// Converts a relay payload into the WebSocket frame that carries it,
/// preserving the message kind.
fn payload_to_frame(payload: RelayPayload) -> WsMessage {
    match payload {
        RelayPayload::Text(text) => WsMessage::Text(text),
        RelayPayload::Binary(bytes) => WsMessage::Binary(bytes),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
