//! Connected peers.
//!
//! A `Peer` owns one transport and runs two tasks over it:
//! - the inbound pump reads frames under a sliding read deadline and hands
//!   text to the hub
//! - the outbound pump drains the peer's hub queue and sends liveness pings;
//!   it is the transport's only writer
//!
//! Both pumps share one [`Teardown`], so whichever side notices a failure
//! first ends the peer exactly once.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Transport errors end the peer, never the process

mod inbound;
mod outbound;
mod teardown;

pub use teardown::Teardown;

use relay_core::{PeerConfig, PeerId};
use relay_protocol::RelayMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::hub::{HubHandle, Registration, RemovalReason};
use crate::transport::{FrameReader, FrameWriter};

/// State shared by both pumps of one peer.
#[derive(Clone)]
pub(crate) struct PumpContext {
    pub peer_id: PeerId,
    pub hub: HubHandle,
    pub config: PeerConfig,
    pub teardown: Teardown,
}

/// One registered client connection.
pub struct Peer {
    ctx: PumpContext,
    outbound: mpsc::Receiver<RelayMessage>,
}

impl Peer {
    /// Builds a peer from the hub's registration.
    pub fn new(registration: Registration, hub: HubHandle, config: PeerConfig) -> Self {
        let Registration {
            peer_id,
            outbound,
            shutdown,
        } = registration;

        let teardown = Teardown::new(peer_id.clone(), hub.clone(), shutdown);

        Self {
            ctx: PumpContext {
                peer_id,
                hub,
                config,
                teardown,
            },
            outbound,
        }
    }

    pub fn id(&self) -> &PeerId {
        &self.ctx.peer_id
    }

    /// Returns the peer's teardown guard.
    pub fn teardown(&self) -> Teardown {
        self.ctx.teardown.clone()
    }

    /// Runs both pumps to completion.
    ///
    /// Returns once the peer has been torn down and the transport released,
    /// with the reason recorded by whichever side ended it.
    pub async fn run<R, W>(self, reader: R, writer: W) -> RemovalReason
    where
        R: FrameReader,
        W: FrameWriter,
    {
        let Self { ctx, outbound } = self;

        info!(peer_id = %ctx.peer_id, "Peer started");

        let inbound_task = tokio::spawn(inbound::run(reader, ctx.clone()));
        let outbound_task = tokio::spawn(outbound::run(writer, outbound, ctx.clone()));

        let (inbound_result, outbound_result) = tokio::join!(inbound_task, outbound_task);
        if let Err(e) = inbound_result {
            warn!(peer_id = %ctx.peer_id, error = %e, "Inbound pump aborted");
        }
        if let Err(e) = outbound_result {
            warn!(peer_id = %ctx.peer_id, error = %e, "Outbound pump aborted");
        }

        // A hub-side removal has already recorded its reason, making this a
        // no-op
        ctx.teardown.trigger(RemovalReason::Evicted).await;
        let reason = ctx.teardown.reason().unwrap_or(RemovalReason::Evicted);

        info!(peer_id = %ctx.peer_id, reason = %reason, "Peer stopped");
        reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use relay_core::HubConfig;
    use relay_protocol::Frame;

    use crate::hub::{spawn_hub, HubEvent};
    use crate::transport::memory::{self, RemoteEnd};
    use crate::transport::TransportError;

    fn test_config() -> PeerConfig {
        PeerConfig {
            read_timeout: Duration::from_secs(60),
            ping_interval: Duration::from_secs(54),
            write_timeout: Duration::from_secs(10),
            ..PeerConfig::default()
        }
    }

    async fn start_peer(
        hub: &HubHandle,
        config: PeerConfig,
    ) -> (PeerId, RemoteEnd, tokio::task::JoinHandle<RemovalReason>) {
        let registration = hub.register().await.unwrap();
        let peer = Peer::new(registration, hub.clone(), config);
        let peer_id = peer.id().clone();
        let (reader, writer, remote) = memory::pair(8);
        let task = tokio::spawn(peer.run(reader, writer));
        (peer_id, remote, task)
    }

    async fn next_left(events: &mut tokio::sync::broadcast::Receiver<HubEvent>) -> (PeerId, RemovalReason) {
        loop {
            if let HubEvent::Left { peer_id, reason } = events.recv().await.unwrap() {
                return (peer_id, reason);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_times_out() {
        let config = PeerConfig::with_read_timeout(Duration::from_secs(60));
        let hub = spawn_hub(HubConfig::default(), &config);
        let mut events = hub.subscribe();

        let (peer_id, _remote, task) = start_peer(&hub, config).await;

        let reason = task.await.unwrap();
        assert_eq!(reason, RemovalReason::ReadTimeout);
        assert_eq!(next_left(&mut events).await, (peer_id, RemovalReason::ReadTimeout));
        assert_eq!(hub.peer_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pongs_keep_peer_alive() {
        let config = PeerConfig::with_read_timeout(Duration::from_secs(60));
        let hub = spawn_hub(HubConfig::default(), &config);

        let (_peer_id, remote, task) = start_peer(&hub, config).await;

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(50)).await;
            remote.send(Frame::Pong(Vec::new())).await.unwrap();
        }
        tokio::task::yield_now().await;

        assert!(!task.is_finished());
        assert_eq!(hub.peer_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_are_sent_on_interval() {
        let config = PeerConfig::with_read_timeout(Duration::from_secs(60));
        let hub = spawn_hub(HubConfig::default(), &config);

        let (_peer_id, mut remote, _task) = start_peer(&hub, config).await;

        let frame = remote.recv().await.unwrap();
        assert_eq!(frame, Frame::ping());
    }

    #[tokio::test]
    async fn test_close_frame_disconnects() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let (_peer_id, remote, task) = start_peer(&hub, test_config()).await;

        remote.send(Frame::Close).await.unwrap();

        assert_eq!(task.await.unwrap(), RemovalReason::Disconnected);
        assert_eq!(hub.peer_count().await, 0);
    }

    #[tokio::test]
    async fn test_read_error_tears_down() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let (_peer_id, remote, task) = start_peer(&hub, test_config()).await;

        remote
            .inject_error(TransportError::Protocol("bad frame".to_string()))
            .await
            .unwrap();

        assert_eq!(task.await.unwrap(), RemovalReason::ReadFailed);
    }

    #[tokio::test]
    async fn test_oversized_frame_tears_down() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let (_a, remote, task) = start_peer(&hub, test_config()).await;
        let (_b, mut other, _other_task) = start_peer(&hub, test_config()).await;

        remote.send_text(&"x".repeat(513)).await.unwrap();

        assert_eq!(task.await.unwrap(), RemovalReason::FrameTooLarge);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropped_client_tears_down() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let (_a, sender, _sender_task) = start_peer(&hub, test_config()).await;
        let (b_id, b_remote, b_task) = start_peer(&hub, test_config()).await;

        // Dropping the client closes both directions at once
        drop(b_remote);

        let reason = b_task.await.unwrap();
        assert!(matches!(
            reason,
            RemovalReason::Disconnected | RemovalReason::WriteFailed
        ));

        sender.send_text("still works").await.unwrap();
        let members = hub.members().await;
        assert!(members.iter().all(|m| m.peer_id != b_id));
    }

    #[tokio::test]
    async fn test_hub_unregister_stops_pumps() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let (peer_id, mut remote, task) = start_peer(&hub, test_config()).await;

        hub.unregister(peer_id, RemovalReason::Backpressure).await;

        assert_eq!(task.await.unwrap(), RemovalReason::Backpressure);
        // Writer closed the transport on the way out
        assert_eq!(remote.recv().await, Some(Frame::Close));
    }

    #[tokio::test]
    async fn test_double_teardown_matches_single() {
        let hub = spawn_hub(HubConfig::default(), &test_config());
        let mut events = hub.subscribe();
        let registration = hub.register().await.unwrap();
        let peer = Peer::new(registration, hub.clone(), test_config());
        let teardown = peer.teardown();
        let (reader, writer, _remote) = memory::pair(8);
        let task = tokio::spawn(peer.run(reader, writer));

        let (first, second) = tokio::join!(
            teardown.trigger(RemovalReason::ReadFailed),
            teardown.trigger(RemovalReason::WriteFailed),
        );
        assert!(first ^ second);

        let reason = task.await.unwrap();
        assert_eq!(Some(reason), teardown.reason());
        assert_eq!(hub.peer_count().await, 0);

        // One Joined, one Left, nothing else
        assert!(matches!(events.recv().await.unwrap(), HubEvent::Joined { .. }));
        assert!(matches!(events.recv().await.unwrap(), HubEvent::Left { .. }));
        assert!(events.try_recv().is_err());
    }
}
