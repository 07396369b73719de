//! Outbound pump: hub queue → transport, plus liveness pings.
//!
//! This is the only task that writes to the peer's transport, so queued
//! messages and pings share one loop.

use relay_protocol::{Frame, RelayMessage};
use tokio::sync::mpsc;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::PumpContext;
use crate::hub::RemovalReason;
use crate::transport::{FrameWriter, TransportError};

/// Writes queued messages and periodic pings until the peer is torn down,
/// then closes the transport.
pub(super) async fn run<W: FrameWriter>(
    mut writer: W,
    mut outbound: mpsc::Receiver<RelayMessage>,
    ctx: PumpContext,
) {
    let mut ping_tick = interval(ctx.config.ping_interval);
    ping_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ping_tick.tick().await; // consume first immediate tick

    loop {
        tokio::select! {
            biased;

            _ = ctx.teardown.cancelled() => break,

            // Pings outrank queued messages
            _ = ping_tick.tick() => match write_frame(&mut writer, Frame::ping(), &ctx).await {
                Some(Ok(())) => trace!(peer_id = %ctx.peer_id, "Sent ping"),
                Some(Err(e)) => {
                    warn!(peer_id = %ctx.peer_id, error = %e, "Ping failed");
                    ctx.teardown.trigger(RemovalReason::PingFailed).await;
                    break;
                }
                None => break,
            },

            next = outbound.recv() => match next {
                Some(message) => match write_frame(&mut writer, Frame::text(message.as_str()), &ctx).await {
                    Some(Ok(())) => {
                        trace!(peer_id = %ctx.peer_id, bytes = message.len(), "Wrote message");
                    }
                    Some(Err(e)) => {
                        warn!(peer_id = %ctx.peer_id, error = %e, "Write failed");
                        ctx.teardown.trigger(RemovalReason::WriteFailed).await;
                        break;
                    }
                    None => break,
                },
                None => {
                    debug!(peer_id = %ctx.peer_id, "Outbound queue closed by hub");
                    ctx.teardown.trigger(RemovalReason::Evicted).await;
                    break;
                }
            },
        }
    }

    match timeout(ctx.config.write_timeout, writer.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!(peer_id = %ctx.peer_id, error = %e, "Close failed"),
        Err(_) => debug!(peer_id = %ctx.peer_id, "Close timed out"),
    }
}

/// Writes one frame under the write deadline.
///
/// Returns `None` if the peer was torn down while the write was pending.
async fn write_frame<W: FrameWriter>(
    writer: &mut W,
    frame: Frame,
    ctx: &PumpContext,
) -> Option<Result<(), TransportError>> {
    let write = timeout(ctx.config.write_timeout, writer.write_frame(frame));

    tokio::select! {
        biased;

        _ = ctx.teardown.cancelled() => None,

        result = write => Some(match result {
            Ok(result) => result,
            Err(_) => Err(TransportError::Io(format!(
                "write deadline of {:?} expired",
                ctx.config.write_timeout
            ))),
        }),
    }
}
