//! WebSocket listener: accept loop and upgrade admission policy.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections.
//! 3. Spawning one session task per connection (see `session.rs` for the
//!    lifecycle each task drives).
//! 4. Deciding, at upgrade time, whether a request may become a signaling
//!    WebSocket at all: wrong path → HTTP 404, disallowed origin → HTTP 403.
//! 5. Gracefully shutting down when the `running` flag is cleared.
//!
//! # Scalability
//!
//! The accept loop never blocks on a session: it accepts a connection and
//! immediately spawns a task for it before accepting the next one. A relay
//! only ever *pairs* two connections, but rejected extras (role conflicts,
//! bad handshakes) still cost an accept + task each, so the loop stays
//! non-blocking the same way a general-purpose server's would.
//!
//! # Portability
//!
//! Uses only `tokio::net` APIs, portable across Windows, Linux, and macOS.
//! Shutdown is triggered by a shared `AtomicBool` set by a Ctrl+C handler in
//! `main.rs`, which is also cross-platform.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tracing::{error, info, warn};

use crate::application::{RegistryHandle, RoleRegistry};
use crate::domain::RelayConfig;
use crate::infrastructure::session::handle_connection;

// ── Upgrade admission policy ──────────────────────────────────────────────────

/// Why an HTTP request was refused before the WebSocket upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpgradeRefusal {
    /// The request path is not the configured signaling endpoint.
    #[error("no signaling endpoint at {path:?}")]
    PathNotFound { path: String },

    /// The `Origin` header is absent or not in the configured allow-list.
    #[error("origin {origin:?} is not allowed")]
    OriginForbidden { origin: Option<String> },
}

impl UpgradeRefusal {
    /// The HTTP status sent in place of the `101 Switching Protocols`.
    pub fn status(&self) -> StatusCode {
        match self {
            UpgradeRefusal::PathNotFound { .. } => StatusCode::NOT_FOUND,
            UpgradeRefusal::OriginForbidden { .. } => StatusCode::FORBIDDEN,
        }
    }
}

/// Decides whether an upgrade request may proceed.
///
/// Pure function over the request's path and `Origin` header so the policy
/// matrix can be unit-tested without sockets. The path must match the
/// configured signaling path exactly; the origin check delegates to
/// [`RelayConfig::origin_allowed`] (permissive when no allow-list is set).
pub fn check_upgrade_request(
    path: &str,
    origin: Option<&str>,
    config: &RelayConfig,
) -> Result<(), UpgradeRefusal> {
    if path != config.signal_path {
        return Err(UpgradeRefusal::PathNotFound {
            path: path.to_owned(),
        });
    }
    if !config.origin_allowed(origin) {
        return Err(UpgradeRefusal::OriginForbidden {
            origin: origin.map(str::to_owned),
        });
    }
    Ok(())
}

// ── Listener ──────────────────────────────────────────────────────────────────

/// The relay's accept loop, bound and ready to run.
///
/// Constructed with [`RelayListener::bind`] so that callers (and tests
/// binding port `0`) can learn the actual listening address before any
/// connection is accepted.
pub struct RelayListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: Arc<RelayConfig>,
    registry: RegistryHandle,
}

impl RelayListener {
    /// Binds the TCP listener for `config.bind_addr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound (port already in
    /// use, insufficient permissions, ...).
    pub async fn bind(config: RelayConfig, registry: RegistryHandle) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .with_context(|| format!("failed to bind signaling listener on {}", config.bind_addr))?;
        // With port 0 the OS picks a free port; report the real one.
        let local_addr = listener
            .local_addr()
            .context("failed to read the listener's local address")?;

        info!(
            "signaling relay listening on ws://{local_addr}{}",
            config.signal_path
        );

        Ok(Self {
            listener,
            local_addr,
            config: Arc::new(config),
            registry,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the accept loop until `running` is set to `false`.
    ///
    /// Each accepted connection is handed to a dedicated Tokio task running
    /// the session lifecycle, so one slow client never delays the next
    /// accept. The short timeout on `accept()` exists purely so the loop can
    /// periodically check the shutdown flag even when nobody is connecting.
    pub async fn run(self, running: Arc<AtomicBool>) {
        loop {
            if !running.load(Ordering::Relaxed) {
                info!("shutdown flag set; stopping accept loop");
                break;
            }

            let accept_result = timeout(Duration::from_millis(200), self.listener.accept()).await;

            match accept_result {
                Ok(Ok((stream, peer_addr))) => {
                    info!("new connection from {peer_addr}");
                    let config = Arc::clone(&self.config);
                    let registry = self.registry.clone();
                    tokio::spawn(async move {
                        handle_connection(stream, peer_addr, config, registry).await;
                    });
                }
                Ok(Err(e)) => {
                    // Transient accept error (e.g. out of file descriptors).
                    // Log it and keep serving rather than crashing the relay.
                    error!("accept error: {e}");
                }
                Err(_) => {
                    // Timeout — no new connection in the last 200 ms.
                    // Loop back to check the `running` flag.
                }
            }
        }
    }
}

/// Binds and runs a complete relay: registry task plus accept loop.
///
/// This is the whole server — `main.rs` only adds configuration parsing and
/// the Ctrl+C handler around it.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound.
pub async fn run_server(config: RelayConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let (registry, handle) = RoleRegistry::new();
    tokio::spawn(registry.run());

    let listener = RelayListener::bind(config, handle).await?;
    listener.run(running).await;

    Ok(())
}

// ── Helper ────────────────────────────────────────────────────────────────────

/// Logs an upgrade refusal at the appropriate level.
///
/// A wrong path is usually a probe or a typo (warn once, move on); a
/// forbidden origin is a policy decision worth the same visibility.
pub(crate) fn log_refusal(peer_addr: SocketAddr, refusal: &UpgradeRefusal) {
    warn!(
        "refusing upgrade from {peer_addr} with {}: {refusal}",
        refusal.status()
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_origins(origins: &[&str]) -> RelayConfig {
        RelayConfig {
            allowed_origins: origins.iter().map(|s| s.to_string()).collect(),
            ..RelayConfig::default()
        }
    }

    #[test]
    fn test_default_path_is_accepted() {
        let config = RelayConfig::default();
        assert_eq!(check_upgrade_request("/signal", None, &config), Ok(()));
    }

    #[test]
    fn test_wrong_path_is_404() {
        // Arrange
        let config = RelayConfig::default();
        // Act
        let refusal = check_upgrade_request("/other", None, &config).unwrap_err();
        // Assert
        assert_eq!(refusal.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            refusal,
            UpgradeRefusal::PathNotFound {
                path: "/other".to_owned()
            }
        );
    }

    #[test]
    fn test_path_match_is_exact() {
        let config = RelayConfig::default();
        assert!(check_upgrade_request("/signal/", None, &config).is_err());
        assert!(check_upgrade_request("/Signal", None, &config).is_err());
        assert!(check_upgrade_request("/signal2", None, &config).is_err());
    }

    #[test]
    fn test_custom_signal_path_is_honored() {
        let config = RelayConfig {
            signal_path: "/ws".to_owned(),
            ..RelayConfig::default()
        };
        assert_eq!(check_upgrade_request("/ws", None, &config), Ok(()));
        assert!(check_upgrade_request("/signal", None, &config).is_err());
    }

    #[test]
    fn test_permissive_default_accepts_any_origin() {
        let config = RelayConfig::default();
        assert_eq!(
            check_upgrade_request("/signal", Some("https://anywhere.example"), &config),
            Ok(())
        );
        assert_eq!(check_upgrade_request("/signal", None, &config), Ok(()));
    }

    #[test]
    fn test_listed_origin_is_accepted() {
        let config = config_with_origins(&["https://cam.example"]);
        assert_eq!(
            check_upgrade_request("/signal", Some("https://cam.example"), &config),
            Ok(())
        );
    }

    #[test]
    fn test_unlisted_origin_is_403() {
        // Arrange
        let config = config_with_origins(&["https://cam.example"]);
        // Act
        let refusal =
            check_upgrade_request("/signal", Some("https://evil.example"), &config).unwrap_err();
        // Assert
        assert_eq!(refusal.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_missing_origin_is_403_when_list_is_set() {
        let config = config_with_origins(&["https://cam.example"]);
        let refusal = check_upgrade_request("/signal", None, &config).unwrap_err();
        assert_eq!(
            refusal,
            UpgradeRefusal::OriginForbidden { origin: None }
        );
    }

    #[test]
    fn test_path_check_runs_before_origin_check() {
        // A probe for the wrong path gets a 404 even when its origin would
        // also have been refused; the endpoint's existence is decided first.
        let config = config_with_origins(&["https://cam.example"]);
        let refusal =
            check_upgrade_request("/other", Some("https://evil.example"), &config).unwrap_err();
        assert_eq!(refusal.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_refusal_messages_name_the_offender() {
        let path = UpgradeRefusal::PathNotFound {
            path: "/other".to_owned(),
        };
        assert!(path.to_string().contains("/other"));

        let origin = UpgradeRefusal::OriginForbidden {
            origin: Some("https://evil.example".to_owned()),
        };
        assert!(origin.to_string().contains("https://evil.example"));
    }
}
