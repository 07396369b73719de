//! Client interface for interacting with the HubActor.
//!
//! The `HubHandle` provides a cheap-to-clone interface for sending commands
//! to the hub actor and subscribing to membership events.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `HubError::ChannelClosed` or ignored for
//!   fire-and-forget commands

use relay_core::PeerId;
use relay_protocol::RelayMessage;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{HubCommand, HubError, HubEvent, MemberInfo, Registration, RemovalReason};

/// Handle for interacting with the hub actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
///
/// # Usage
///
/// ```ignore
/// let registration = hub.register().await?;
/// hub.broadcast(Some(registration.peer_id.clone()), "hello".into()).await;
/// hub.unregister(registration.peer_id, RemovalReason::Disconnected).await;
/// ```
#[derive(Clone)]
pub struct HubHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<HubCommand>,

    /// Event broadcaster for subscribing to membership changes
    event_sender: broadcast::Sender<HubEvent>,
}

impl HubHandle {
    /// Create a new hub handle.
    pub fn new(sender: mpsc::Sender<HubCommand>, event_sender: broadcast::Sender<HubEvent>) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Register a new peer.
    ///
    /// # Errors
    ///
    /// - `HubError::HubFull` if the hub is at maximum capacity
    /// - `HubError::ChannelClosed` if the actor has shut down
    pub async fn register(&self) -> Result<Registration, HubError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(HubCommand::Register { respond_to: tx })
            .await
            .map_err(|_| HubError::ChannelClosed)?;

        rx.await.map_err(|_| HubError::ChannelClosed)?
    }

    /// Remove a peer from the hub.
    ///
    /// Fire-and-forget: unknown peers and a stopped actor are both ignored.
    pub async fn unregister(&self, peer_id: PeerId, reason: RemovalReason) {
        let _ = self
            .sender
            .send(HubCommand::Unregister { peer_id, reason })
            .await;
    }

    /// Broadcast a message to every peer except `origin`.
    ///
    /// Returns `false` only if the actor has shut down. Delivery to
    /// individual peers is never reported.
    pub async fn broadcast(&self, origin: Option<PeerId>, message: RelayMessage) -> bool {
        self.sender
            .send(HubCommand::Broadcast { origin, message })
            .await
            .is_ok()
    }

    /// Snapshot of all registered peers, ordered by registration.
    ///
    /// Returns an empty vector if communication with the actor fails.
    pub async fn members(&self) -> Vec<MemberInfo> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(HubCommand::GetMembers { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }

    /// Number of registered peers.
    pub async fn peer_count(&self) -> usize {
        self.members().await.len()
    }

    /// Subscribe to membership events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.event_sender.subscribe()
    }

    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_handle() -> (HubHandle, mpsc::Receiver<HubCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = broadcast::channel(16);
        (HubHandle::new(cmd_tx, event_tx), cmd_rx)
    }

    #[tokio::test]
    async fn test_register_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.register().await;
        assert!(matches!(result, Err(HubError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_register_dropped_responder_is_channel_closed() {
        let (handle, mut rx) = create_test_handle();

        tokio::spawn(async move {
            if let Some(HubCommand::Register { respond_to }) = rx.recv().await {
                drop(respond_to);
            }
        });

        let result = handle.register().await;
        assert!(matches!(result, Err(HubError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_unregister_sends_command() {
        let (handle, mut rx) = create_test_handle();

        handle
            .unregister(PeerId::new("peer-3"), RemovalReason::WriteFailed)
            .await;

        match rx.recv().await {
            Some(HubCommand::Unregister { peer_id, reason }) => {
                assert_eq!(peer_id.as_str(), "peer-3");
                assert_eq!(reason, RemovalReason::WriteFailed);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregister_ignores_closed_channel() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        // Should not panic or error
        handle
            .unregister(PeerId::new("peer-1"), RemovalReason::Disconnected)
            .await;
    }

    #[tokio::test]
    async fn test_broadcast_sends_command() {
        let (handle, mut rx) = create_test_handle();

        assert!(
            handle
                .broadcast(Some(PeerId::new("peer-1")), RelayMessage::from("hi"))
                .await
        );

        match rx.recv().await {
            Some(HubCommand::Broadcast { origin, message }) => {
                assert_eq!(origin, Some(PeerId::new("peer-1")));
                assert_eq!(message.as_str(), "hi");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reports_stopped_hub() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(!handle.broadcast(None, RelayMessage::from("lost")).await);
    }

    #[tokio::test]
    async fn test_members_empty_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        assert!(handle.members().await.is_empty());
        assert_eq!(handle.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        assert!(!handle.is_connected());
    }
}
