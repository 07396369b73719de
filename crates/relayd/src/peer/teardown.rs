//! Close-once teardown shared by a peer's two pumps.
//!
//! Either pump (or the hub, by cancelling the shared [`PeerShutdown`]) can
//! end a peer. The first side to cancel records the reason. When a pump wins
//! [`Teardown::trigger`] also unregisters the peer; every later call is a
//! no-op.

use std::sync::Arc;

use relay_core::PeerId;
use tracing::debug;

use crate::hub::{HubHandle, PeerShutdown, RemovalReason};

/// Cheap-to-clone teardown guard for one peer.
#[derive(Clone)]
pub struct Teardown {
    inner: Arc<Inner>,
}

struct Inner {
    peer_id: PeerId,
    hub: HubHandle,
    shutdown: PeerShutdown,
}

impl Teardown {
    /// Creates a guard around the shutdown the hub issued at registration.
    pub fn new(peer_id: PeerId, hub: HubHandle, shutdown: PeerShutdown) -> Self {
        Self {
            inner: Arc::new(Inner {
                peer_id,
                hub,
                shutdown,
            }),
        }
    }

    /// Tears the peer down. Returns `true` only for the call that did it.
    pub async fn trigger(&self, reason: RemovalReason) -> bool {
        if !self.inner.shutdown.cancel(reason) {
            debug!(
                peer_id = %self.inner.peer_id,
                reason = %reason,
                "Teardown already done"
            );
            return false;
        }

        self.inner
            .hub
            .unregister(self.inner.peer_id.clone(), reason)
            .await;
        true
    }

    /// Reason recorded by whichever side ended the peer, if any.
    pub fn reason(&self) -> Option<RemovalReason> {
        self.inner.shutdown.reason()
    }

    /// True once the peer is shutting down, whoever started it.
    pub fn is_cancelled(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Completes once the peer is shutting down.
    pub async fn cancelled(&self) {
        self.inner.shutdown.cancelled().await;
    }
}
