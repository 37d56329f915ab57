//! Relay configuration types.
//!
//! [`RelayConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments and an optional TOML file
//! (preferred for production) or from sensible defaults (useful for local
//! development and tests).
//!
//! # Design rationale
//!
//! Keeping configuration as a plain struct (no global state, no environment
//! variable reads inside the domain) makes the relay easy to embed in tests
//! and future orchestration systems.  The infrastructure layer is responsible
//! for populating the struct from CLI args, environment variables, or a
//! config file.

use std::net::SocketAddr;
use std::time::Duration;

/// Default TCP port for the signaling listener.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP path that upgrades to the signaling WebSocket.
pub const DEFAULT_SIGNAL_PATH: &str = "/signal";

/// Default number of seconds a fresh connection gets to declare its role.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// All runtime configuration for the signaling relay.
///
/// Build this struct once at startup (via CLI args, a config file, or
/// defaults) and then wrap it in an `Arc` so it can be shared cheaply across
/// all session tasks.
///
/// # Example
///
/// ```rust
/// use solocast_relay::domain::RelayConfig;
///
/// // Defaults are suitable for local development:
/// let cfg = RelayConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 8080);
/// assert_eq!(cfg.signal_path, "/signal");
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The address and port the WebSocket listener binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface (LAN +
    /// localhost).  Set to `127.0.0.1` to accept only local connections, for
    /// example when the relay sits behind a reverse proxy.
    pub bind_addr: SocketAddr,

    /// The HTTP request path that upgrades to the signaling WebSocket.
    ///
    /// Requests for any other path are refused with `404` before the
    /// WebSocket handshake completes.
    pub signal_path: String,

    /// Origins allowed to open a signaling connection.
    ///
    /// An empty list means any `Origin` header (or none at all) is accepted,
    /// which is the right default for native clients and same-host pages.
    /// When the list is non-empty, browsers must present an exactly-matching
    /// `Origin` header or the upgrade is refused with `403`.
    pub allowed_origins: Vec<String>,

    /// How long a fresh connection may sit on the socket before declaring
    /// its role.  `None` disables the deadline, which leaves the relay open
    /// to clients that connect and never speak.
    pub handshake_timeout: Option<Duration>,

    /// How long a paired connection may stay silent before the relay closes
    /// it.  `None` (the default) disables the deadline; WebSocket
    /// ping/pong traffic counts as activity, so well-behaved clients are
    /// never cut off by this.
    pub idle_timeout: Option<Duration>,
}

impl RelayConfig {
    /// Returns whether a connection presenting `origin` may be upgraded.
    ///
    /// `origin` is the raw `Origin` header value, or `None` when the request
    /// carried no such header (typical for non-browser clients).  With an
    /// empty allow-list every connection passes; otherwise only an exact
    /// string match against one of the configured entries passes, and a
    /// missing header is refused.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        if self.allowed_origins.is_empty() {
            return true;
        }
        match origin {
            Some(origin) => self.allowed_origins.iter().any(|allowed| allowed == origin),
            None => false,
        }
    }
}

impl Default for RelayConfig {
    /// Returns a `RelayConfig` suitable for local development without any
    /// external configuration.
    ///
    /// | Field             | Default        |
    /// |-------------------|----------------|
    /// | bind_addr         | `0.0.0.0:8080` |
    /// | signal_path       | `/signal`      |
    /// | allowed_origins   | empty (any)    |
    /// | handshake_timeout | 10 seconds     |
    /// | idle_timeout      | disabled       |
    fn default() -> Self {
        Self {
            // The `.parse().unwrap()` call here is safe because this is a
            // compile-time-known valid socket address string.
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}").parse().unwrap(),
            signal_path: DEFAULT_SIGNAL_PATH.to_owned(),
            allowed_origins: Vec::new(),
            handshake_timeout: Some(Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS)),
            idle_timeout: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
