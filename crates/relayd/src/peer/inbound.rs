//! Inbound pump: transport → hub.

use relay_protocol::{Frame, RelayMessage};
use tokio::time::timeout;
use tracing::{debug, info, trace};

use super::PumpContext;
use crate::hub::RemovalReason;
use crate::transport::{FrameReader, TransportError};

/// Reads frames until the peer is torn down.
///
/// Every frame renews the read deadline. Text frames are normalized and
/// broadcast; everything that ends the connection triggers teardown.
pub(super) async fn run<R: FrameReader>(mut reader: R, ctx: PumpContext) {
    let max_size = ctx.config.max_message_size;

    loop {
        let next = tokio::select! {
            biased;

            _ = ctx.teardown.cancelled() => return,

            result = timeout(ctx.config.read_timeout, reader.read_frame()) => result,
        };

        let frame = match next {
            Ok(Ok(frame)) => frame,
            Ok(Err(TransportError::Closed)) => {
                debug!(peer_id = %ctx.peer_id, "Transport closed by client");
                ctx.teardown.trigger(RemovalReason::Disconnected).await;
                return;
            }
            Ok(Err(e)) => {
                debug!(peer_id = %ctx.peer_id, error = %e, "Read failed");
                ctx.teardown.trigger(RemovalReason::ReadFailed).await;
                return;
            }
            Err(_) => {
                info!(
                    peer_id = %ctx.peer_id,
                    timeout = ?ctx.config.read_timeout,
                    "Read deadline expired"
                );
                ctx.teardown.trigger(RemovalReason::ReadTimeout).await;
                return;
            }
        };

        if let Err(e) = frame.check_size(max_size) {
            info!(
                peer_id = %ctx.peer_id,
                kind = %frame.kind(),
                error = %e,
                "Rejecting oversized frame"
            );
            ctx.teardown.trigger(RemovalReason::FrameTooLarge).await;
            return;
        }

        trace!(
            peer_id = %ctx.peer_id,
            kind = %frame.kind(),
            bytes = frame.payload_len(),
            "Frame received"
        );

        match frame {
            Frame::Text(text) => {
                let message = RelayMessage::from_inbound(&text);
                debug!(peer_id = %ctx.peer_id, bytes = message.len(), "Received message");

                let delivered = tokio::select! {
                    biased;
                    _ = ctx.teardown.cancelled() => return,
                    sent = ctx.hub.broadcast(Some(ctx.peer_id.clone()), message) => sent,
                };
                if !delivered {
                    ctx.teardown.trigger(RemovalReason::HubShutdown).await;
                    return;
                }
            }
            Frame::Binary(data) => {
                debug!(peer_id = %ctx.peer_id, bytes = data.len(), "Ignoring binary frame");
            }
            Frame::Ping(_) | Frame::Pong(_) => {}
            Frame::Close => {
                debug!(peer_id = %ctx.peer_id, "Client sent close frame");
                ctx.teardown.trigger(RemovalReason::Disconnected).await;
                return;
            }
        }
    }
}
