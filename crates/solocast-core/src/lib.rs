//! # solocast-core
//!
//! Shared vocabulary for Solocast, a one-to-one WebRTC signaling relay.
//! The relay pairs exactly one *broadcaster* connection with exactly one
//! *viewer* connection and forwards opaque signaling payloads between them.
//!
//! This crate is used by both the relay server (`solocast-relay`) and the
//! client library (`solocast-client`). It has zero dependencies on network
//! sockets, async runtimes, or any particular WebSocket implementation.
//!
//! What lives here:
//!
//! - **`domain`** – The two relay roles and the generated per-connection
//!   identity used for all slot-ownership checks.
//!
//! - **`protocol`** – The shapes that cross the wire: the kind-preserving
//!   relay payload (text stays text, binary stays binary) and the three
//!   reserved rejection texts the server may originate.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `solocast_core::Role` instead of `solocast_core::domain::role::Role`.
pub use domain::connection::ConnectionId;
pub use domain::role::{Role, UnknownRoleToken};
pub use protocol::payload::RelayPayload;
pub use protocol::reject::RejectReason;
