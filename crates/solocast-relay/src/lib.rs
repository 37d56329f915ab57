//! solocast-relay library crate.
//!
//! A one-to-one WebRTC signaling relay: pairs exactly one *broadcaster*
//! WebSocket connection with exactly one *viewer* connection and forwards
//! opaque signaling payloads between them, verbatim. The relay holds no
//! persistent state and never looks inside a payload.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Clients  (role token, then opaque payloads, over WebSocket)
//!         ↕
//! [solocast-relay]
//!   ├── domain/          RelayConfig + origin admission policy (no I/O)
//!   ├── application/     Role registry task, payload router
//!   └── infrastructure/
//!         ├── ws_server/    TCP accept loop + upgrade policy (tokio-tungstenite)
//!         ├── session/      Per-connection lifecycle + writer task
//!         └── config_file/  Optional TOML settings file
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain`, `solocast-core`, and tokio's channel
//!   primitives only — no sockets.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tokio-tungstenite`.
//!
//! # The one invariant everything serves
//!
//! At any instant, at most one live connection holds each role, and a
//! connection's slot is always vacated when its session ends — no matter how
//! it ends. Every module here is shaped around making that easy to see:
//! slot state lives in exactly one task (`application::registry`), and the
//! cleanup step in `infrastructure::session` runs on every exit path.

/// Domain layer: pure configuration and policy types (no I/O).
pub mod domain;

/// Application layer: role registry and payload routing.
pub mod application;

/// Infrastructure layer: WebSocket listener, sessions, config file.
pub mod infrastructure;
