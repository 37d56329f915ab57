//! The two relay roles and the handshake token that selects them.
//!
//! A client declares its role by sending the literal text `broadcaster` or
//! `viewer` as the first message on a fresh connection. Matching is
//! exact-byte: case-sensitive, no surrounding whitespace tolerated, and a
//! binary frame containing the same bytes is accepted just like a text frame.
//! Anything else is an [`UnknownRoleToken`].

use thiserror::Error;

/// Literal handshake token for the broadcaster role.
pub const BROADCASTER_TOKEN: &str = "broadcaster";

/// Literal handshake token for the viewer role.
pub const VIEWER_TOKEN: &str = "viewer";

/// The role a connection plays in the relay.
///
/// Exactly one connection may hold each role at any instant, and a
/// connection's role never changes once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Originates the media/negotiation session.
    Broadcaster,
    /// Receives the broadcaster's session.
    Viewer,
}

/// Error returned when a handshake message is not a recognized role token.
///
/// Carries the offending token (lossily decoded for binary frames) so the
/// relay can log what the client actually sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role token {token:?}")]
pub struct UnknownRoleToken {
    /// The token the client sent, decoded lossily if it was not valid UTF-8.
    pub token: String,
}

impl Role {
    /// Parses a handshake message into a role.
    ///
    /// Comparison is exact-byte: `"Broadcaster"`, `" viewer"`, and
    /// `"broadcaster\n"` are all rejected.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownRoleToken`] (carrying the offending token) when the
    /// bytes match neither role token exactly.
    pub fn from_token(token: &[u8]) -> Result<Self, UnknownRoleToken> {
        if token == BROADCASTER_TOKEN.as_bytes() {
            Ok(Role::Broadcaster)
        } else if token == VIEWER_TOKEN.as_bytes() {
            Ok(Role::Viewer)
        } else {
            Err(UnknownRoleToken {
                token: String::from_utf8_lossy(token).into_owned(),
            })
        }
    }

    /// Returns the literal handshake token for this role.
    pub fn as_token(self) -> &'static str {
        match self {
            Role::Broadcaster => BROADCASTER_TOKEN,
            Role::Viewer => VIEWER_TOKEN,
        }
    }

    /// Returns the other role: the one this role's messages are forwarded to.
    pub fn opposite(self) -> Self {
        match self {
            Role::Broadcaster => Role::Viewer,
            Role::Viewer => Role::Broadcaster,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_token())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
