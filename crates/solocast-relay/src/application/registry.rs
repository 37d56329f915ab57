//! Role registry: the single owner of the broadcaster and viewer slots.
//!
//! Exactly one connection may hold each [`Role`] at a time.  The registry
//! enforces this by funnelling every slot operation through one task that
//! owns the state outright:
//!
//! ```text
//! session A ── try_assign ──►┐
//! session B ── release ─────►│ mpsc ──► RoleRegistry::run ──► RoleSlots
//! session C ── lookup ──────►┘            (one task)
//! ```
//!
//! # Why an owning task instead of a lock? (for beginners)
//!
//! A `Mutex<RoleSlots>` would also work, but the task form has two
//! properties worth having here:
//!
//! - Atomicity falls out of message ordering.  "Check the slot, then claim
//!   it" is a single command processed in one go; there is no window where
//!   two racing connections both observe a vacant slot.
//! - The slots can never be held across a socket write.  Command handlers
//!   are synchronous, so a slow peer cannot stretch the critical section;
//!   other sessions only ever wait on in-memory work.
//!
//! Each request carries a `oneshot` reply channel, so callers get an answer
//! for their own command rather than a broadcast they must filter.

use solocast_core::{ConnectionId, RelayPayload, Role};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// How many registry commands may queue before senders wait.
///
/// Commands are tiny and each live connection issues at most a handful over
/// its whole lifetime, so a small buffer is plenty.
const COMMAND_BUFFER: usize = 32;

/// Everything the relay needs to reach a connected peer.
///
/// Cloning is cheap: the queue sender is reference-counted.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    /// Identity of the owning connection.  Releases are matched against it
    /// so a connection can only ever vacate its own claim.
    pub conn_id: ConnectionId,
    /// Producer side of the connection's outbound queue.  Payloads pushed
    /// here are written to the peer's socket by that connection's own
    /// writer task.
    pub outbound: mpsc::Sender<RelayPayload>,
}

impl PartialEq for PeerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.conn_id == other.conn_id && self.outbound.same_channel(&other.outbound)
    }
}

/// Commands accepted by the registry task.
enum RegistryCommand {
    /// Claim `role` for `peer` if the slot is vacant.
    TryAssign {
        role: Role,
        peer: PeerHandle,
        reply: oneshot::Sender<bool>,
    },
    /// Vacate `role` if `conn_id` is still the occupant.  Acknowledged so
    /// the caller knows the slot no longer points at it.
    Release {
        role: Role,
        conn_id: ConnectionId,
        reply: oneshot::Sender<()>,
    },
    /// Snapshot the current occupant of `role`.
    Lookup {
        role: Role,
        reply: oneshot::Sender<Option<PeerHandle>>,
    },
}

/// The registry task has stopped and can no longer serve requests.
///
/// Sessions treat this as fatal and shut down; it only happens when the
/// relay itself is coming down.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role registry task is no longer running")]
pub struct RegistryClosed;

/// Which connection currently owns each role.  Pure state, no I/O.
#[derive(Debug, Default)]
struct RoleSlots {
    broadcaster: Option<PeerHandle>,
    viewer: Option<PeerHandle>,
}

impl RoleSlots {
    fn slot_mut(&mut self, role: Role) -> &mut Option<PeerHandle> {
        match role {
            Role::Broadcaster => &mut self.broadcaster,
            Role::Viewer => &mut self.viewer,
        }
    }

    /// Claims `role` for `peer` when the slot is vacant.  An occupied slot
    /// is left untouched and the claim reports `false`.
    fn try_assign(&mut self, role: Role, peer: PeerHandle) -> bool {
        let slot = self.slot_mut(role);
        if slot.is_some() {
            return false;
        }
        *slot = Some(peer);
        true
    }

    /// Vacates `role` only when `conn_id` matches the current occupant.
    /// Returns whether the slot was actually vacated.
    fn release(&mut self, role: Role, conn_id: ConnectionId) -> bool {
        let slot = self.slot_mut(role);
        match slot {
            Some(occupant) if occupant.conn_id == conn_id => {
                *slot = None;
                true
            }
            _ => false,
        }
    }

    fn lookup(&self, role: Role) -> Option<PeerHandle> {
        match role {
            Role::Broadcaster => self.broadcaster.clone(),
            Role::Viewer => self.viewer.clone(),
        }
    }
}

/// The registry task.  Create one per relay, spawn [`RoleRegistry::run`],
/// and hand out clones of the [`RegistryHandle`].
pub struct RoleRegistry {
    commands: mpsc::Receiver<RegistryCommand>,
    slots: RoleSlots,
}

impl RoleRegistry {
    /// Creates the registry and the handle sessions use to reach it.
    pub fn new() -> (Self, RegistryHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let registry = Self {
            commands: commands_rx,
            slots: RoleSlots::default(),
        };
        (registry, RegistryHandle { commands: commands_tx })
    }

    /// Processes commands until every [`RegistryHandle`] has been dropped.
    ///
    /// Commands run strictly one at a time; that serialization is what makes
    /// check-and-claim atomic.  No handler ever awaits a peer socket, so a
    /// slow connection cannot stall admission of the next one.
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle_command(command);
        }
        debug!("role registry stopped: all handles dropped");
    }

    fn handle_command(&mut self, command: RegistryCommand) {
        match command {
            RegistryCommand::TryAssign { role, peer, reply } => {
                let conn_id = peer.conn_id;
                let assigned = self.slots.try_assign(role, peer);
                if assigned {
                    info!("{role} slot assigned to connection {conn_id}");
                } else {
                    debug!("{role} slot occupied; refusing connection {conn_id}");
                }
                // The requester may have given up waiting; that is fine.
                let _ = reply.send(assigned);
            }
            RegistryCommand::Release { role, conn_id, reply } => {
                if self.slots.release(role, conn_id) {
                    info!("{role} slot released by connection {conn_id}");
                } else {
                    // Stale release: the slot is already empty, or it was
                    // handed to a newer connection in the meantime.
                    debug!("ignoring release of {role} slot by non-occupant {conn_id}");
                }
                let _ = reply.send(());
            }
            RegistryCommand::Lookup { role, reply } => {
                let _ = reply.send(self.slots.lookup(role));
            }
        }
    }
}

/// Cheaply cloneable client side of the registry task.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    commands: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// Atomically claims `role` for `peer`.
    ///
    /// Returns `Ok(true)` when the slot was vacant and now belongs to the
    /// peer, `Ok(false)` when another connection already holds it.
    pub async fn try_assign(&self, role: Role, peer: PeerHandle) -> Result<bool, RegistryClosed> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(RegistryCommand::TryAssign { role, peer, reply })
            .await
            .map_err(|_| RegistryClosed)?;
        response.await.map_err(|_| RegistryClosed)
    }

    /// Vacates `role` if (and only if) `conn_id` still owns it.
    ///
    /// Once this future resolves the registry has processed the release, so
    /// the caller knows its slot no longer points at it.  Releasing a slot
    /// that was never claimed, or that has since moved to a newer
    /// connection, is a harmless no-op.
    pub async fn release(&self, role: Role, conn_id: ConnectionId) -> Result<(), RegistryClosed> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(RegistryCommand::Release { role, conn_id, reply })
            .await
            .map_err(|_| RegistryClosed)?;
        response.await.map_err(|_| RegistryClosed)
    }

    /// Returns the current occupant of `role`, if any.
    ///
    /// The returned handle is a snapshot: the occupant can disconnect right
    /// after the lookup, in which case pushes onto its outbound queue fail
    /// and the caller drops the payload.
    pub async fn lookup(&self, role: Role) -> Result<Option<PeerHandle>, RegistryClosed> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(RegistryCommand::Lookup { role, reply })
            .await
            .map_err(|_| RegistryClosed)?;
        response.await.map_err(|_| RegistryClosed)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
