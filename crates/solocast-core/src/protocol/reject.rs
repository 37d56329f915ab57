//! The reserved rejection texts.
//!
//! These three strings are the only messages the relay server ever
//! originates; everything else a client receives was forwarded from its
//! peer. They are sent as text frames immediately before the server closes
//! the rejected connection. Their wording is part of the protocol and must
//! not change.
//!
//! Because payloads are opaque, a peer could in principle relay an identical
//! string; clients that want to distinguish the two cases should treat these
//! texts as reserved and not use them as application payloads.

use crate::domain::role::Role;

/// Why the relay refused a connection during the role handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The requested role's slot is already occupied by a live connection.
    RoleTaken(Role),
    /// The first message was not a recognized role token.
    UnknownRole,
}

impl RejectReason {
    /// The exact text frame the server sends for this rejection.
    pub fn message(self) -> &'static str {
        match self {
            RejectReason::RoleTaken(Role::Broadcaster) => "error: broadcaster already exists",
            RejectReason::RoleTaken(Role::Viewer) => "error: viewer already exists",
            RejectReason::UnknownRole => "error: unknown role",
        }
    }

    /// Recognizes a received text as one of the reserved rejection messages.
    ///
    /// Matching is exact; partial or decorated variants return `None` so that
    /// ordinary relayed payloads are never misclassified by accident.
    pub fn from_message(text: &str) -> Option<Self> {
        match text {
            "error: broadcaster already exists" => {
                Some(RejectReason::RoleTaken(Role::Broadcaster))
            }
            "error: viewer already exists" => Some(RejectReason::RoleTaken(Role::Viewer)),
            "error: unknown role" => Some(RejectReason::UnknownRole),
            _ => None,
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcaster_taken_text_is_exact() {
        assert_eq!(
            RejectReason::RoleTaken(Role::Broadcaster).message(),
            "error: broadcaster already exists"
        );
    }

    #[test]
    fn test_viewer_taken_text_is_exact() {
        assert_eq!(
            RejectReason::RoleTaken(Role::Viewer).message(),
            "error: viewer already exists"
        );
    }

    #[test]
    fn test_unknown_role_text_is_exact() {
        assert_eq!(RejectReason::UnknownRole.message(), "error: unknown role");
    }

    #[test]
    fn test_from_message_round_trips_all_reasons() {
        for reason in [
            RejectReason::RoleTaken(Role::Broadcaster),
            RejectReason::RoleTaken(Role::Viewer),
            RejectReason::UnknownRole,
        ] {
            assert_eq!(RejectReason::from_message(reason.message()), Some(reason));
        }
    }

    #[test]
    fn test_from_message_requires_exact_match() {
        assert_eq!(RejectReason::from_message("error: unknown role "), None);
        assert_eq!(RejectReason::from_message("Error: unknown role"), None);
        assert_eq!(
            RejectReason::from_message("error: broadcaster already exists!"),
            None
        );
        assert_eq!(RejectReason::from_message("hello"), None);
        assert_eq!(RejectReason::from_message(""), None);
    }

    #[test]
    fn test_display_matches_wire_text() {
        assert_eq!(
            RejectReason::UnknownRole.to_string(),
            "error: unknown role"
        );
    }
}
