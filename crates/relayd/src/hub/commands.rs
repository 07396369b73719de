//! Hub actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `HubActor`:
//! - `HubCommand`: Commands sent to the actor
//! - `HubError`: Errors that can occur during hub operations
//! - `HubEvent`: Membership events published by the hub for observers
//!
//! All types are designed for async message passing and follow the panic-free policy.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use relay_core::PeerId;
use relay_protocol::RelayMessage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Hub Commands
// ============================================================================

/// Commands sent to the hub actor.
///
/// Commands that need an answer carry a oneshot channel for the response.
/// `Unregister` and `Broadcast` are fire-and-forget: nothing about a
/// peer's fate is ever reported back to the sender.
#[derive(Debug)]
pub enum HubCommand {
    /// Admit a new peer.
    ///
    /// The actor assigns the `PeerId` and creates the outbound queue.
    ///
    /// # Errors
    /// - `HubError::HubFull` if at maximum capacity
    Register {
        /// Channel to send the result
        respond_to: oneshot::Sender<Result<Registration, HubError>>,
    },

    /// Remove a peer. A no-op if the peer is not registered.
    Unregister {
        /// ID of the peer to remove
        peer_id: PeerId,
        /// Why the peer is leaving
        reason: RemovalReason,
    },

    /// Fan a message out to every registered peer except `origin`.
    Broadcast {
        /// Peer the message came from, excluded from delivery
        origin: Option<PeerId>,
        /// The message to deliver
        message: RelayMessage,
    },

    /// Snapshot the current membership.
    GetMembers {
        /// Channel to send the results
        respond_to: oneshot::Sender<Vec<MemberInfo>>,
    },
}

/// What a newly registered peer receives from the hub.
#[derive(Debug)]
pub struct Registration {
    /// Identity assigned by the hub
    pub peer_id: PeerId,

    /// Receiving end of the peer's bounded outbound queue.
    /// Closed by the hub when the peer is unregistered.
    pub outbound: mpsc::Receiver<RelayMessage>,

    /// Cancelled by the hub when the peer is unregistered.
    pub shutdown: PeerShutdown,
}

/// Shutdown signal shared by the hub and one peer.
///
/// The first side to cancel records its reason. The other side sees the
/// cancellation and reads that reason instead of guessing one.
#[derive(Debug, Clone, Default)]
pub struct PeerShutdown {
    token: CancellationToken,
    reason: Arc<OnceLock<RemovalReason>>,
}

impl PeerShutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reason` and cancels. Returns `true` only for the first call.
    pub fn cancel(&self, reason: RemovalReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    /// Reason recorded by the first cancel, if any.
    pub fn reason(&self) -> Option<RemovalReason> {
        self.reason.get().copied()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once either side has cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

/// Read-only view of one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub peer_id: PeerId,
    pub joined_at: DateTime<Utc>,
}

// ============================================================================
// Hub Errors
// ============================================================================

/// Errors that can occur during hub operations.
#[derive(Debug, Clone, Error)]
pub enum HubError {
    /// The hub has reached its maximum peer capacity.
    #[error("hub is full (max: {max} peers)")]
    HubFull {
        /// Maximum number of peers allowed
        max: usize,
    },

    /// The command or response channel was closed.
    ///
    /// This typically indicates the actor was shut down.
    #[error("hub channel closed")]
    ChannelClosed,
}

// ============================================================================
// Hub Events
// ============================================================================

/// Membership events published by the hub to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    /// A peer was registered.
    Joined {
        /// ID of the registered peer
        peer_id: PeerId,
    },

    /// A peer was removed from the membership set.
    Left {
        /// ID of the removed peer
        peer_id: PeerId,
        /// Why the peer was removed
        reason: RemovalReason,
    },
}

/// Reason why a peer was removed from the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// The client closed the connection.
    Disconnected,

    /// No frame arrived within the read deadline.
    ReadTimeout,

    /// Reading from the transport failed.
    ReadFailed,

    /// The client sent a frame larger than the allowed maximum.
    FrameTooLarge,

    /// Writing a message to the transport failed or timed out.
    WriteFailed,

    /// Writing a ping failed or timed out.
    PingFailed,

    /// The peer's outbound queue was full during a broadcast.
    Backpressure,

    /// The peer's outbound queue was already closed.
    Evicted,

    /// The hub stopped while the peer was registered.
    HubShutdown,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "client disconnected"),
            Self::ReadTimeout => write!(f, "read deadline expired"),
            Self::ReadFailed => write!(f, "transport read failed"),
            Self::FrameTooLarge => write!(f, "inbound frame too large"),
            Self::WriteFailed => write!(f, "transport write failed"),
            Self::PingFailed => write!(f, "ping failed"),
            Self::Backpressure => write!(f, "outbound queue full"),
            Self::Evicted => write!(f, "outbound queue closed"),
            Self::HubShutdown => write!(f, "hub shut down"),
        }
    }
}
