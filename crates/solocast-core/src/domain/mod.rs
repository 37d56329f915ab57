//! Domain entities for the Solocast relay.
//!
//! Pure business-logic types with no infrastructure dependencies: no sockets,
//! no async, no WebSocket framing. Everything here can be unit-tested on any
//! platform without external setup.
//!
//! The two concepts that make the relay what it is live here:
//!
//! - [`role::Role`] – the broadcaster/viewer pair. Each registry slot holds at
//!   most one connection per role, and a connection's role never changes once
//!   assigned.
//! - [`connection::ConnectionId`] – a generated identifier compared by value.
//!   Slot ownership checks (who may release a slot) work on this identity,
//!   never on pointer or reference equality.

pub mod connection;
pub mod role;

pub use connection::ConnectionId;
pub use role::{Role, UnknownRoleToken};
