//! WebSocket transport over axum's upgraded connection.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use relay_protocol::Frame;

use super::{FrameReader, FrameWriter, TransportError};

/// Reading half of an upgraded WebSocket.
pub struct WsReader {
    stream: SplitStream<WebSocket>,
}

/// Writing half of an upgraded WebSocket.
pub struct WsWriter {
    sink: SplitSink<WebSocket, Message>,
}

/// Splits an upgraded socket into transport halves.
pub fn split(socket: WebSocket) -> (WsReader, WsWriter) {
    let (sink, stream) = socket.split();
    (WsReader { stream }, WsWriter { sink })
}

fn into_frame(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_owned()),
        Message::Binary(data) => Frame::Binary(data.to_vec()),
        Message::Ping(data) => Frame::Ping(data.to_vec()),
        Message::Pong(data) => Frame::Pong(data.to_vec()),
        Message::Close(_) => Frame::Close,
    }
}

fn into_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(data) => Message::Binary(data.into()),
        Frame::Ping(data) => Message::Ping(data.into()),
        Frame::Pong(data) => Message::Pong(data.into()),
        Frame::Close => Message::Close(None),
    }
}

#[async_trait]
impl FrameReader for WsReader {
    async fn read_frame(&mut self) -> Result<Frame, TransportError> {
        match self.stream.next().await {
            Some(Ok(message)) => Ok(into_frame(message)),
            // Oversized frames and malformed input surface here
            Some(Err(e)) => Err(TransportError::Protocol(e.to_string())),
            None => Err(TransportError::Closed),
        }
    }
}

#[async_trait]
impl FrameWriter for WsWriter {
    async fn write_frame(&mut self, frame: Frame) -> Result<(), TransportError> {
        self.sink
            .send(into_message(frame))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // SinkExt::close sends the close frame, flushes, and closes
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_conversion_preserves_content() {
        let message = into_message(Frame::text("hello world"));
        assert!(matches!(&message, Message::Text(t) if t.as_str() == "hello world"));
        assert_eq!(into_frame(message), Frame::text("hello world"));
    }

    #[test]
    fn test_control_frames_map_to_control_messages() {
        assert!(matches!(into_message(Frame::ping()), Message::Ping(_)));
        assert!(matches!(into_message(Frame::Close), Message::Close(None)));
        assert_eq!(into_frame(Message::Pong(Vec::new().into())), Frame::Pong(Vec::new()));
        assert_eq!(into_frame(Message::Close(None)), Frame::Close);
    }
}
