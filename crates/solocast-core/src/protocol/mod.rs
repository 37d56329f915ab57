//! Wire-facing protocol types shared by relay and clients.
//!
//! The relay never interprets what it forwards; [`payload::RelayPayload`]
//! exists only to preserve the message *kind* (text vs binary) end to end.
//! [`reject::RejectReason`] enumerates the three reserved texts that are the
//! only messages the server itself ever originates.

pub mod payload;
pub mod reject;

pub use payload::RelayPayload;
pub use reject::RejectReason;
