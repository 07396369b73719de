//! Relay Core - Shared types for the broadcast relay
//!
//! This crate provides the identifiers and configuration shared between
//! the daemon (`relayd`) and its binaries.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod config;
pub mod error;
pub mod peer;

// Re-exports for convenience
pub use config::{HubConfig, PeerConfig, RelayConfig, DEFAULT_LISTEN_ADDR};
pub use error::{ConfigError, ConfigResult};
pub use peer::PeerId;
