//! Peer hub using Actor pattern.
//!
//! The hub is the single source of truth for which peers are connected.
//! It receives commands via a tokio mpsc channel, owns the membership set,
//! and fans broadcast messages out to every peer's bounded outbound queue.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │   Peer pumps    │────▶│    HubActor     │────▶│ per-peer queues  │
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │                        │
//!         │   HubCommand          │   try_send             │
//!         │   (mpsc channel)      │   (never blocks)       │
//!         ▼                       ▼                        ▼
//!   Register/Unregister    HashMap<PeerId,         Each peer's writer
//!   Broadcast              Member>                 drains its own queue
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All operations in this module follow the panic-free policy:
//! - No `.unwrap()` or `.expect()` in production code
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

use relay_core::{HubConfig, PeerConfig};
use tokio::sync::{broadcast, mpsc};

mod actor;
mod commands;
mod handle;

pub use actor::HubActor;
pub use commands::{
    HubCommand, HubError, HubEvent, MemberInfo, PeerShutdown, Registration, RemovalReason,
};
pub use handle::HubHandle;

/// Membership event buffer size
const EVENT_BUFFER: usize = 256;

/// Spawn the hub actor and return a handle for interaction.
///
/// The actor stops once every clone of the returned handle has been dropped.
///
/// # Example
///
/// ```no_run
/// use relay_core::{HubConfig, PeerConfig};
/// use relayd::hub::spawn_hub;
///
/// #[tokio::main]
/// async fn main() {
///     let hub = spawn_hub(HubConfig::default(), &PeerConfig::default());
///     let peers = hub.peer_count().await;
///     assert_eq!(peers, 0);
/// }
/// ```
pub fn spawn_hub(config: HubConfig, peer: &PeerConfig) -> HubHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer.max(1));
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = HubActor::new(cmd_rx, event_tx.clone(), config, peer.send_queue_capacity);
    tokio::spawn(actor.run());

    HubHandle::new(cmd_tx, event_tx)
}
