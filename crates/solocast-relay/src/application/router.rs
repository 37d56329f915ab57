//! Message router: forwards relay payloads to the opposite role.
//!
//! The router is deliberately dumb. It never parses a payload, never queues
//! across peer changes, and never retries: it asks the registry who currently
//! holds the opposite slot and pushes the payload onto that connection's
//! outbound queue. If the slot is vacant the payload is dropped silently.
//!
//! # Ordering
//!
//! Each session calls [`RelayRouter::forward`] synchronously inside its own
//! receive loop, so a single sender's payloads reach the peer's outbound
//! queue in receive order. No ordering holds *across* senders.
//!
//! # Why the router never touches a socket
//!
//! The registry lookup returns a [`PeerHandle`] snapshot, and the send here
//! goes onto the peer's private in-memory queue, drained by that peer's own
//! writer task. The registry task is never waiting on us while the peer's
//! socket is slow, so one stalled connection can never block handshakes or
//! disconnect cleanup for everyone else.

use solocast_core::{RelayPayload, Role};
use tracing::debug;

use crate::application::registry::{RegistryClosed, RegistryHandle};

/// What happened to a forwarded payload.
///
/// Only [`Delivered`](ForwardOutcome::Delivered) means the payload reached
/// the peer's outbound queue; the other two outcomes both end in the payload
/// being dropped, which is expected relay behavior, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The payload was handed to the peer's writer task.
    Delivered,
    /// The opposite slot is vacant; the payload was dropped.
    NoPeer,
    /// The peer was registered but its outbound queue is gone (it is in the
    /// middle of disconnecting); the payload was dropped.
    PeerUnavailable,
}

/// Forwards payloads between the broadcaster and viewer slots.
///
/// Cheap to clone; every session task holds one.
#[derive(Debug, Clone)]
pub struct RelayRouter {
    registry: RegistryHandle,
}

impl RelayRouter {
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry }
    }

    /// Forwards `payload` from `sender_role` to the opposite role's occupant.
    ///
    /// The payload is passed through verbatim, kind preserved. Waits if the
    /// peer's outbound queue is momentarily full (backpressure from a slow
    /// peer slows only this sender, never the registry).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryClosed`] only when the registry task itself is gone,
    /// which means the relay is shutting down.
    pub async fn forward(
        &self,
        sender_role: Role,
        payload: RelayPayload,
    ) -> Result<ForwardOutcome, RegistryClosed> {
        let peer_role = sender_role.opposite();

        let Some(peer) = self.registry.lookup(peer_role).await? else {
            debug!(
                "{sender_role} sent {} bytes of {} with no {peer_role} attached; dropping",
                payload.len(),
                payload.kind()
            );
            return Ok(ForwardOutcome::NoPeer);
        };

        // The snapshot can be stale: the peer may have started disconnecting
        // after the lookup. A failed push is treated like drop-on-absence.
        match peer.outbound.send(payload).await {
            Ok(()) => Ok(ForwardOutcome::Delivered),
            Err(_) => {
                debug!(
                    "{peer_role} connection {} vanished mid-forward; dropping payload",
                    peer.conn_id
                );
                Ok(ForwardOutcome::PeerUnavailable)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
