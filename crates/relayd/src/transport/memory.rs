//! In-process transport backed by bounded channels.
//!
//! `pair` returns the two server-side halves plus a `RemoteEnd` that plays
//! the client: frames it sends are read by the `MemoryReader`, and frames
//! written to the `MemoryWriter` arrive at the remote. A remote that stops
//! reading makes writes block once the channel is full, which is how a
//! stuck client looks to the peer pumps.

use async_trait::async_trait;
use relay_protocol::Frame;
use tokio::sync::mpsc;

use super::{FrameReader, FrameWriter, TransportError};

/// Reading half of an in-memory transport.
pub struct MemoryReader {
    rx: mpsc::Receiver<Result<Frame, TransportError>>,
}

/// Writing half of an in-memory transport.
pub struct MemoryWriter {
    tx: Option<mpsc::Sender<Frame>>,
}

/// The client side of an in-memory transport.
pub struct RemoteEnd {
    to_server: mpsc::Sender<Result<Frame, TransportError>>,
    from_server: mpsc::Receiver<Frame>,
}

/// Creates a connected transport with `capacity` frames of buffering in
/// each direction.
pub fn pair(capacity: usize) -> (MemoryReader, MemoryWriter, RemoteEnd) {
    let capacity = capacity.max(1);
    let (to_server, server_rx) = mpsc::channel(capacity);
    let (server_tx, from_server) = mpsc::channel(capacity);

    (
        MemoryReader { rx: server_rx },
        MemoryWriter {
            tx: Some(server_tx),
        },
        RemoteEnd {
            to_server,
            from_server,
        },
    )
}

#[async_trait]
impl FrameReader for MemoryReader {
    async fn read_frame(&mut self) -> Result<Frame, TransportError> {
        match self.rx.recv().await {
            Some(result) => result,
            None => Err(TransportError::Closed),
        }
    }
}

#[async_trait]
impl FrameWriter for MemoryWriter {
    async fn write_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(tx) = self.tx.take() {
            // Best effort: a full or dropped remote just misses the close frame
            let _ = tx.try_send(Frame::Close);
        }
        Ok(())
    }
}

impl RemoteEnd {
    /// Sends a frame to the server.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.to_server
            .send(Ok(frame))
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Sends a text frame to the server.
    pub async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.send(Frame::text(text)).await
    }

    /// Makes the server's next read fail with `error`.
    pub async fn inject_error(&self, error: TransportError) -> Result<(), TransportError> {
        self.to_server
            .send(Err(error))
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Waits for the next frame from the server. `None` once the server's
    /// writer is gone.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.from_server.recv().await
    }

    /// Waits for the next text frame, skipping pings and pongs.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            match self.from_server.recv().await? {
                Frame::Text(text) => return Some(text),
                Frame::Close => return None,
                _ => continue,
            }
        }
    }

    /// Returns a frame if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.from_server.try_recv().ok()
    }
}
