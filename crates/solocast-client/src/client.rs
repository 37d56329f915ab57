//! The relay client: connect, declare a role, exchange payloads.
//!
//! [`RelayClient::connect`] dials the relay's `/signal` endpoint and sends
//! the role token as the very first message, exactly as the handshake
//! protocol requires. The relay sends no acknowledgement on success, so a
//! fresh client is simply ready to [`send`](RelayClient::send) and
//! [`recv`](RelayClient::recv).
//!
//! Rejections arrive as ordinary text frames carrying one of the three
//! reserved server error texts; [`RelayClient::recv`] recognizes them and
//! surfaces a typed [`ClientError::Rejected`] instead of handing the text to
//! the application as a payload.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use solocast_core::{RejectReason, RelayPayload, Role};

/// Error type for relay client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The WebSocket connection to the relay could not be established.
    #[error("failed to connect to relay at {url}: {source}")]
    Connect { url: String, source: WsError },

    /// A send or receive failed on the established connection.
    #[error("WebSocket transport error: {0}")]
    Transport(WsError),

    /// The relay refused this connection during the role handshake.
    #[error("relay rejected the connection: {0}")]
    Rejected(RejectReason),

    /// The relay closed the connection.
    #[error("relay closed the connection")]
    Closed,
}

/// A role-assigned connection to the Solocast relay.
///
/// # Example
///
/// ```rust,no_run
/// use solocast_client::RelayClient;
/// use solocast_core::{RelayPayload, Role};
///
/// # async fn run() -> Result<(), solocast_client::ClientError> {
/// let mut client =
///     RelayClient::connect("ws://127.0.0.1:8080/signal", Role::Broadcaster).await?;
/// client.send(RelayPayload::Text("{\"type\":\"offer\"}".into())).await?;
/// let answer = client.recv().await?;
/// # let _ = answer;
/// # Ok(())
/// # }
/// ```
pub struct RelayClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    role: Role,
}

impl RelayClient {
    /// Connects to the relay at `url` and declares `role`.
    ///
    /// Returns as soon as the role token is on the wire: the relay stays
    /// silent on success, so any rejection surfaces from the first
    /// [`recv`](RelayClient::recv) instead.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connect`] when the WebSocket handshake fails
    /// (including the relay's 404/403 upgrade refusals) and
    /// [`ClientError::Transport`] when sending the role token fails.
    pub async fn connect(url: &str, role: Role) -> Result<Self, ClientError> {
        let (mut ws, _response) =
            connect_async(url)
                .await
                .map_err(|source| ClientError::Connect {
                    url: url.to_owned(),
                    source,
                })?;

        ws.send(WsMessage::Text(role.as_token().to_owned()))
            .await
            .map_err(ClientError::Transport)?;

        debug!("connected to {url} as {role}");
        Ok(Self { ws, role })
    }

    /// The role this client declared at connect time.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Sends one payload to the relay, kind preserved.
    ///
    /// The relay forwards it to the opposite role's occupant, or drops it
    /// silently when that slot is vacant — delivery is never confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when the write fails.
    pub async fn send(&mut self, payload: RelayPayload) -> Result<(), ClientError> {
        let frame = match payload {
            RelayPayload::Text(text) => WsMessage::Text(text),
            RelayPayload::Binary(bytes) => WsMessage::Binary(bytes),
        };
        self.ws.send(frame).await.map_err(ClientError::Transport)
    }

    /// Receives the next payload relayed from the peer.
    ///
    /// Transport control frames are skipped. A text frame that exactly
    /// matches one of the three reserved server error texts is surfaced as
    /// [`ClientError::Rejected`]; a peer could in principle relay an
    /// identical string, which is why those texts are documented as
    /// reserved.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Rejected`] — the relay refused the handshake.
    /// - [`ClientError::Closed`] — the relay closed the connection.
    /// - [`ClientError::Transport`] — the receive failed.
    pub async fn recv(&mut self) -> Result<RelayPayload, ClientError> {
        loop {
            match self.ws.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    if let Some(reason) = RejectReason::from_message(&text) {
                        return Err(ClientError::Rejected(reason));
                    }
                    return Ok(RelayPayload::Text(text));
                }
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(RelayPayload::Binary(bytes)),
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => {
                    // Transport-level frames; not application payloads.
                }
                Some(Ok(WsMessage::Close(_))) => return Err(ClientError::Closed),
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    return Err(ClientError::Closed)
                }
                Some(Err(e)) => return Err(ClientError::Transport(e)),
                None => return Err(ClientError::Closed),
            }
        }
    }

    /// Closes the connection explicitly.
    ///
    /// Dropping the client closes the socket too; this variant sends a
    /// proper WebSocket Close frame first.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.ws.close(None).await.map_err(ClientError::Transport)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // Live relay round-trips are covered in `tests/client_relay.rs`; these
    // tests pin the pure error-surface behavior.

    #[test]
    fn test_rejected_error_carries_the_reason() {
        let err = ClientError::Rejected(RejectReason::RoleTaken(Role::Broadcaster));
        assert_eq!(
            err.to_string(),
            "relay rejected the connection: error: broadcaster already exists"
        );
    }

    #[test]
    fn test_connect_error_names_the_url() {
        let err = ClientError::Connect {
            url: "ws://relay.example:8080/signal".to_owned(),
            source: WsError::ConnectionClosed,
        };
        assert!(err.to_string().contains("ws://relay.example:8080/signal"));
    }

    #[tokio::test]
    async fn test_connect_to_unreachable_relay_fails_with_connect_error() {
        // Port 1 on localhost is essentially guaranteed closed.
        let result = RelayClient::connect("ws://127.0.0.1:1/signal", Role::Viewer).await;
        assert!(matches!(result, Err(ClientError::Connect { .. })));
    }
}
