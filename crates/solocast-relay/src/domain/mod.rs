//! Domain layer for solocast-relay.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or external frameworks.  This makes them
//! easy to test in isolation and portable to any runtime or platform.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures and admission policy (origin checks)
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - File I/O or environment variable reading
//! - Anything that could block or fail due to external state
//!
//! The role and payload vocabulary shared with client binaries lives in the
//! `solocast-core` crate rather than here, so both sides of the wire agree
//! on it by construction.

// Declare the sub-modules that make up the domain layer.
pub mod config;

// Re-export the most commonly needed types at the domain module boundary
// so callers can write `domain::RelayConfig` instead of the longer path.
pub use config::{
    RelayConfig, DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_SIGNAL_PATH,
};
