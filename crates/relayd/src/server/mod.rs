//! HTTP server for the relay daemon.
//!
//! The server:
//! - Listens on a TCP address for HTTP requests
//! - Upgrades `GET /ws` to a WebSocket and runs a `Peer` for it
//! - Serves the landing page on `GET /`
//! - Supports graceful shutdown via CancellationToken
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   RelayServer   │
//! │                 │
//! │   TcpListener   │
//! └───────┬─────────┘
//!         │ axum::serve
//!         ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │  Peer (per ws)  │────▶│    HubHandle    │
//! │ inbound/outbound│◀────│                 │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Upgrade and peer failures are logged and never stop the listener

mod routes;

pub use routes::{build_router, AppState, BUNDLED_HOME_PAGE};

use std::net::SocketAddr;

use relay_core::RelayConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::hub::HubHandle;

/// HTTP + WebSocket server for the relay.
pub struct RelayServer {
    config: RelayConfig,
    hub: HubHandle,
    cancel_token: CancellationToken,
}

impl RelayServer {
    /// Creates a new relay server.
    ///
    /// # Arguments
    ///
    /// * `config` - Listen address, landing page, and peer settings
    /// * `hub` - Handle to the running hub
    /// * `cancel_token` - Token for graceful shutdown
    pub fn new(config: RelayConfig, hub: HubHandle, cancel_token: CancellationToken) -> Self {
        Self {
            config,
            hub,
            cancel_token,
        }
    }

    /// Binds the configured address and serves until cancelled.
    pub async fn run(&self) -> Result<(), ServerError> {
        let (listener, _) = bind(&self.config.bind_addr()).await?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener until cancelled.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        let state = AppState::new(
            self.hub.clone(),
            self.config.peer,
            self.config.home_page.clone(),
        );
        let router = build_router(state);

        info!(addr = %local_addr, "Relay server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(self.cancel_token.clone().cancelled_owned())
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("Relay server stopped");
        Ok(())
    }
}

/// Binds `addr` and returns the listener together with its actual address.
///
/// Useful with port 0, where the OS picks the port.
pub async fn bind(addr: &str) -> Result<(TcpListener, SocketAddr), ServerError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            error: e.to_string(),
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|e| ServerError::Serve(e.to_string()))?;
    Ok((listener, local_addr))
}

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {error}")]
    Bind { addr: String, error: String },

    #[error("Server error: {0}")]
    Serve(String),
}
