//! Connection transports.
//!
//! A transport is a full-duplex, message-framed channel to one client,
//! split into a reading half and a writing half so the two peer pumps can
//! own one each. Neither trait applies deadlines; callers wrap every call in
//! `tokio::time::timeout`.
//!
//! Implementations:
//! - `websocket` - axum WebSocket halves
//! - `memory` - in-process channels, for embedding and tests

pub mod memory;
pub mod websocket;

use async_trait::async_trait;
use relay_protocol::Frame;
use thiserror::Error;

/// Reading half of a transport.
#[async_trait]
pub trait FrameReader: Send + 'static {
    /// Waits for the next frame.
    ///
    /// Returns `TransportError::Closed` once the stream has ended.
    async fn read_frame(&mut self) -> Result<Frame, TransportError>;
}

/// Writing half of a transport. Exactly one task may own it.
#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Writes one frame and flushes it.
    async fn write_frame(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Sends a close frame and shuts the writing half down.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Errors that can occur on a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
