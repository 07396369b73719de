//! Relay Protocol - Wire framing for the broadcast relay
//!
//! This crate provides the frame model shared by every transport
//! and the message type that flows through the hub:
//! - `frame` - frame kinds recognized from the underlying transport
//! - `message` - immutable broadcast payloads and inbound normalization

pub mod frame;
pub mod message;

pub use frame::{Frame, FrameError, FrameKind};
pub use message::{normalize, RelayMessage};
