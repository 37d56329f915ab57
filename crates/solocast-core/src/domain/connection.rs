//! Generated per-connection identity.
//!
//! Every accepted connection gets a fresh [`ConnectionId`] before any registry
//! interaction. All slot-ownership decisions (may this connection release the
//! broadcaster slot?) compare these identifiers by value, so ownership is
//! independent of handle cloning or reference identity.

use uuid::Uuid;

/// Value-comparable identity of a single relay connection.
///
/// Wraps a UUID v4. Two handles refer to the same connection iff their
/// `ConnectionId`s are equal; cloning a handle never changes identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generates a fresh, unique connection identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
