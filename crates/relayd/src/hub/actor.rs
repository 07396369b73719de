//! Hub actor - owns the membership set and performs broadcast fan-out.
//!
//! The HubActor is the single owner of peer membership in the system.
//! It receives commands via an mpsc channel and publishes membership events
//! via broadcast.
//!
//! # Panic-Free Guarantees
//!
//! This module follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `unwrap_or`
//! - Channel send failures are logged but don't panic

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use relay_core::{HubConfig, PeerId};
use relay_protocol::RelayMessage;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::commands::{
    HubCommand, HubError, HubEvent, MemberInfo, PeerShutdown, Registration, RemovalReason,
};

/// One registered peer as seen by the hub.
struct Member {
    /// Producer side of the peer's outbound queue. The hub holds the only
    /// sender, so dropping it closes the queue.
    outbound: mpsc::Sender<RelayMessage>,

    /// Cancels both of the peer's pumps.
    shutdown: PeerShutdown,

    joined_at: DateTime<Utc>,
}

/// Result of one fan-out, used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct BroadcastOutcome {
    /// Number of enqueue attempts made
    pub attempted: usize,
    /// Number of queues that accepted the message
    pub delivered: usize,
    /// Peers removed because their queue was full or closed
    pub evicted: Vec<PeerId>,
}

/// The hub actor - owns all membership state.
///
/// Implements the actor pattern: receives commands via mpsc channel,
/// processes them sequentially, and publishes events to subscribers.
///
/// # Thread Safety
///
/// The actor runs in a single task and processes commands sequentially.
/// All membership mutations happen within this single task, and no command
/// handler ever awaits, so a stalled peer cannot hold up the loop.
pub struct HubActor {
    /// Command receiver
    receiver: mpsc::Receiver<HubCommand>,

    /// Registered peers
    members: HashMap<PeerId, Member>,

    /// Sequence number for the next assigned `PeerId`
    next_sequence: u64,

    /// Capacity of each new peer's outbound queue
    queue_capacity: usize,

    /// Maximum number of registered peers
    max_peers: usize,

    /// Event publisher for membership observers
    event_publisher: broadcast::Sender<HubEvent>,
}

impl HubActor {
    /// Creates a new hub actor.
    ///
    /// # Arguments
    ///
    /// * `receiver` - Channel for receiving commands
    /// * `event_publisher` - Broadcast channel for publishing events
    /// * `config` - Peer limit
    /// * `queue_capacity` - Capacity of every peer's outbound queue
    pub fn new(
        receiver: mpsc::Receiver<HubCommand>,
        event_publisher: broadcast::Sender<HubEvent>,
        config: HubConfig,
        queue_capacity: usize,
    ) -> Self {
        Self {
            receiver,
            members: HashMap::new(),
            next_sequence: 1,
            queue_capacity: queue_capacity.max(1),
            max_peers: config.max_peers,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all handles dropped),
    /// then cancels every remaining peer.
    pub async fn run(mut self) {
        info!("Hub actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        let remaining: Vec<PeerId> = self.members.keys().cloned().collect();
        for peer_id in remaining {
            self.handle_unregister(&peer_id, RemovalReason::HubShutdown);
        }

        info!("Hub actor stopped");
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: HubCommand) {
        match cmd {
            HubCommand::Register { respond_to } => {
                let result = self.handle_register();
                if let Err(Ok(registration)) = respond_to.send(result) {
                    // Caller went away before getting its registration
                    self.handle_unregister(&registration.peer_id, RemovalReason::Disconnected);
                }
            }
            HubCommand::Unregister { peer_id, reason } => {
                self.handle_unregister(&peer_id, reason);
            }
            HubCommand::Broadcast { origin, message } => {
                let outcome = self.handle_broadcast(origin.as_ref(), &message);
                debug!(
                    origin = ?origin,
                    bytes = message.len(),
                    attempted = outcome.attempted,
                    delivered = outcome.delivered,
                    evicted = outcome.evicted.len(),
                    "Broadcast complete"
                );
            }
            HubCommand::GetMembers { respond_to } => {
                let _ = respond_to.send(self.handle_get_members());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    fn handle_register(&mut self) -> Result<Registration, HubError> {
        if self.members.len() >= self.max_peers {
            warn!(
                current = self.members.len(),
                max = self.max_peers,
                "Hub is full, rejecting registration"
            );
            return Err(HubError::HubFull {
                max: self.max_peers,
            });
        }

        let peer_id = PeerId::from_sequence(self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let shutdown = PeerShutdown::new();

        self.members.insert(
            peer_id.clone(),
            Member {
                outbound: tx,
                shutdown: shutdown.clone(),
                joined_at: Utc::now(),
            },
        );

        info!(
            peer_id = %peer_id,
            total_peers = self.members.len(),
            "Peer registered"
        );

        // Publish event (ignore if no subscribers)
        let _ = self.event_publisher.send(HubEvent::Joined {
            peer_id: peer_id.clone(),
        });

        Ok(Registration {
            peer_id,
            outbound: rx,
            shutdown,
        })
    }

    /// Removes a peer if present. Returns whether anything was removed.
    fn handle_unregister(&mut self, peer_id: &PeerId, reason: RemovalReason) -> bool {
        let Some(member) = self.members.remove(peer_id) else {
            debug!(peer_id = %peer_id, reason = %reason, "Unregister for unknown peer ignored");
            return false;
        };

        // Dropping the sender closes the queue; cancelling wakes both pumps.
        drop(member.outbound);
        member.shutdown.cancel(reason);

        info!(
            peer_id = %peer_id,
            reason = %reason,
            total_peers = self.members.len(),
            "Peer unregistered"
        );

        let _ = self.event_publisher.send(HubEvent::Left {
            peer_id: peer_id.clone(),
            reason,
        });

        true
    }

    /// Offers `message` to every member except `origin` without waiting.
    ///
    /// A member whose queue is full or closed is removed on the spot.
    pub(crate) fn handle_broadcast(
        &mut self,
        origin: Option<&PeerId>,
        message: &RelayMessage,
    ) -> BroadcastOutcome {
        let mut outcome = BroadcastOutcome::default();
        let mut stalled = Vec::new();

        for (peer_id, member) in &self.members {
            if origin == Some(peer_id) {
                continue;
            }

            outcome.attempted += 1;
            match member.outbound.try_send(message.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(peer_id = %peer_id, "Outbound queue full, dropping peer");
                    stalled.push((peer_id.clone(), RemovalReason::Backpressure));
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(peer_id = %peer_id, "Outbound queue closed, dropping peer");
                    stalled.push((peer_id.clone(), RemovalReason::Evicted));
                }
            }
        }

        for (peer_id, reason) in stalled {
            if self.handle_unregister(&peer_id, reason) {
                outcome.evicted.push(peer_id);
            }
        }

        outcome
    }

    fn handle_get_members(&self) -> Vec<MemberInfo> {
        let mut members: Vec<MemberInfo> = self
            .members
            .iter()
            .map(|(peer_id, member)| MemberInfo {
                peer_id: peer_id.clone(),
                joined_at: member.joined_at,
            })
            .collect();
        members.sort_by_key(|m| m.peer_id.sequence().unwrap_or(u64::MAX));
        members
    }

    /// Returns the number of registered peers.
    #[cfg(test)]
    pub fn peer_count(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the peer is registered.
    #[cfg(test)]
    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.contains_key(peer_id)
    }
}
