//! solocast-client library crate.
//!
//! The client side of the Solocast signaling relay: connect, declare a role,
//! then exchange opaque payloads with whoever holds the opposite role.
//!
//! # Layout
//!
//! ```text
//! [solocast-client]
//!   ├── client/    RelayClient: connect → handshake → send/recv
//!   ├── console/   stdin ⇄ relay loop for the two console binaries
//!   └── bin/
//!         ├── broadcaster.rs   `solocast-broadcaster`
//!         └── viewer.rs        `solocast-viewer`
//! ```
//!
//! # What the client does NOT do
//!
//! No reconnection or backoff (the relay never retries either; a dropped
//! connection is the caller's problem), no payload interpretation, and no
//! media — this is only the signaling half of a WebRTC session.

/// The relay client: connection, handshake, payload exchange.
pub mod client;

/// Interactive stdin ⇄ relay console loop.
pub mod console;

pub use client::{ClientError, RelayClient};
