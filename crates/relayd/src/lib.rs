//! Relay Daemon - Peer hub and WebSocket broadcast server
//!
//! This crate provides the core infrastructure for the relay daemon:
//! - `hub` - Hub actor that owns the membership set and fans messages out
//! - `peer` - Per-connection inbound/outbound pumps with close-once teardown
//! - `transport` - Frame transport abstraction (WebSocket and in-memory)
//! - `server` - axum HTTP server with the `/ws` upgrade endpoint
//! - `cli` - Command-line entry point for the `relayd` binary
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       relayd daemon                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │   RelayServer   │────▶│         HubActor            │   │
//! │  │  (axum, /ws)    │     │  (membership owner)         │   │
//! │  └────────┬────────┘     └──────────────┬──────────────┘   │
//! │           │                             │                   │
//! │           │ upgrades                    │ try_send          │
//! │           ▼                             ▼                   │
//! │  ┌─────────────────┐     ┌─────────────────────────────┐   │
//! │  │      Peer       │◀────│   per-peer mpsc queues      │   │
//! │  │ inbound/outbound│     │   (bounded, never blocks)   │   │
//! │  └─────────────────┘     └─────────────────────────────┘   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod cli;
pub mod hub;
pub mod peer;
pub mod server;
pub mod transport;
