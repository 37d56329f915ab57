//! The opaque payload shape relayed between the two roles.
//!
//! A payload is forwarded verbatim: the relay performs no parsing, no
//! validation, and no re-framing. The only property it preserves besides the
//! bytes themselves is the message kind — a text frame arrives at the peer as
//! a text frame, a binary frame as a binary frame.

/// One application message travelling through the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayPayload {
    /// A text frame. Typically JSON session descriptions or ICE candidates,
    /// but the relay never looks inside.
    Text(String),
    /// A binary frame, forwarded byte for byte.
    Binary(Vec<u8>),
}

impl RelayPayload {
    /// Short kind label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayPayload::Text(_) => "text",
            RelayPayload::Binary(_) => "binary",
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            RelayPayload::Text(text) => text.len(),
            RelayPayload::Binary(bytes) => bytes.len(),
        }
    }

    /// True when the payload carries no bytes. Empty messages are still
    /// forwarded; emptiness is not an error.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
