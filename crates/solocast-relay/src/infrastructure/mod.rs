//! Infrastructure layer for solocast-relay.
//!
//! Everything that touches the outside world lives here: TCP sockets,
//! WebSocket upgrades, per-connection tasks, and the config file on disk.
//!
//! # Responsibilities
//!
//! - Binding the TCP listener and accepting connections
//! - Enforcing the upgrade admission policy (path + origin)
//! - Driving each connection's lifecycle (handshake → receive loop → cleanup)
//! - Owning each connection's outbound writer task
//! - Reading the optional TOML config file
//!
//! # What does NOT belong here?
//!
//! - Slot bookkeeping and forwarding decisions (application layer)
//! - Role tokens, payload shapes, error texts (`solocast-core`)
//! - CLI parsing and config precedence (`main.rs`)

pub mod config_file;
pub mod session;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use config_file::{load_file_config, ConfigFileError, FileConfig};
pub use ws_server::{run_server, RelayListener};
