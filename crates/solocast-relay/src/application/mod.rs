//! Application layer for solocast-relay.
//!
//! The application layer owns the relay's business rules: who may hold a
//! role, and where a payload goes next. It knows nothing about WebSockets,
//! TCP, or HTTP upgrades — sessions in the infrastructure layer feed it
//! already-decoded payloads and role claims.
//!
//! # Responsibilities
//!
//! - The role registry task: atomic assign/release/lookup over a mailbox
//! - Forwarding payloads to the opposite role (or dropping them)
//!
//! # What does NOT belong here?
//!
//! - Socket accept loops and WebSocket framing (infrastructure)
//! - The handshake wire protocol and error texts (`solocast-core`)
//! - Configuration loading (infrastructure + `main.rs`)

pub mod registry;
pub mod router;

// Re-export the pieces sessions actually wire together.
pub use registry::{PeerHandle, RegistryClosed, RegistryHandle, RoleRegistry};
pub use router::{ForwardOutcome, RelayRouter};
