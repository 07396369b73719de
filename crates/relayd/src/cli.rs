//! Command-line entry point for the `relayd` binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on all interfaces, port 8080
//! relayd
//!
//! # Custom address and config file
//! relayd --addr 127.0.0.1:9000 --config /etc/relay.toml
//!
//! # Same, through the environment
//! RELAY_ADDR=127.0.0.1:9000 RELAY_CONFIG=/etc/relay.toml relayd
//!
//! # Enable debug logging
//! RUST_LOG=relayd=debug relayd
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use relay_core::RelayConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::hub::spawn_hub;
use crate::server::RelayServer;

/// relayd - real-time WebSocket broadcast relay
#[derive(Parser, Debug)]
#[command(name = "relayd", version, about)]
pub struct Args {
    /// Address to listen on (`host:port`, or `:port` for all interfaces)
    #[arg(long, env = "RELAY_ADDR")]
    pub addr: Option<String>,

    /// Path to a TOML configuration file
    #[arg(long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// HTML file served on `GET /` instead of the bundled page
    #[arg(long, env = "RELAY_HOME_PAGE")]
    pub home_page: Option<PathBuf>,
}

impl Args {
    /// Builds the effective configuration: file (or defaults), then flags.
    pub fn resolve_config(&self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Some(addr) = &self.addr {
            config.listen_addr = addr.clone();
        }
        if let Some(home_page) = &self.home_page {
            config.home_page = Some(home_page.clone());
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Parses arguments and runs the relay until a shutdown signal arrives.
pub fn run() -> Result<()> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    run_server(config)
}

/// Runs the relay (async entry point).
#[tokio::main]
async fn run_server(config: RelayConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relayd=info".parse()?)
                .add_directive("relay_core=info".parse()?)
                .add_directive("relay_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "Relay daemon starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    let hub = spawn_hub(config.hub, &config.peer);
    info!(
        max_peers = config.hub.max_peers,
        queue_capacity = config.peer.send_queue_capacity,
        "Hub started"
    );

    let server = RelayServer::new(config, hub, cancel_token);
    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Relay daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_flags() {
        let args = Args::try_parse_from(["relayd"]).unwrap();
        if args.addr.is_some() || args.config.is_some() || args.home_page.is_some() {
            // RELAY_* set in the test environment
            return;
        }

        let config = args.resolve_config().unwrap();
        assert_eq!(config, RelayConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_addr = \"127.0.0.1:7000\"\n[peer]\nsend_queue_capacity = 8").unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::try_parse_from([
            "relayd",
            "--config",
            path,
            "--addr",
            "127.0.0.1:9000",
            "--home-page",
            "/srv/index.html",
        ])
        .unwrap();
        let config = args.resolve_config().unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.peer.send_queue_capacity, 8);
        assert_eq!(config.home_page, Some(PathBuf::from("/srv/index.html")));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let args =
            Args::try_parse_from(["relayd", "--config", "/nonexistent/relay.toml"]).unwrap();

        let err = args.resolve_config().unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/relay.toml"));
    }

    #[test]
    fn test_empty_addr_rejected() {
        let args = Args::try_parse_from(["relayd", "--addr", " "]).unwrap();
        assert!(args.resolve_config().is_err());
    }
}
