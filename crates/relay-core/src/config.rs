//! Relay configuration.
//!
//! Every field has a default, so an empty (or missing) TOML file yields a
//! working configuration:
//!
//! ```toml
//! listen_addr = ":8080"
//! # home_page = "resources/home.html"
//!
//! [hub]
//! max_peers = 1024
//! command_buffer = 1024
//!
//! [peer]
//! send_queue_capacity = 256
//! max_message_size = 512
//! read_timeout_secs = 60
//! ping_interval_secs = 54
//! write_timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default listen address (all interfaces, port 8080).
pub const DEFAULT_LISTEN_ADDR: &str = ":8080";

/// Top-level relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address to listen on. A bare `:port` means all interfaces.
    pub listen_addr: String,

    /// Landing page served on `GET /`. `None` serves the bundled page.
    pub home_page: Option<PathBuf>,

    /// Hub limits
    pub hub: HubConfig,

    /// Per-peer connection settings
    pub peer: PeerConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            home_page: None,
            hub: HubConfig::default(),
            peer: PeerConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Loads configuration from a TOML file and validates it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::invalid(
                "listen_addr",
                "\"\"",
                "host:port or :port",
            ));
        }
        self.hub.validate()?;
        self.peer.validate()
    }

    /// Returns the listen address in a form `TcpListener::bind` accepts.
    ///
    /// `":8080"` becomes `"0.0.0.0:8080"`; anything else is returned as-is.
    pub fn bind_addr(&self) -> String {
        let addr = self.listen_addr.trim();
        if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_string()
        }
    }
}

/// Limits applied by the hub actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Maximum number of simultaneously registered peers.
    pub max_peers: usize,

    /// Capacity of the hub's command channel.
    pub command_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_peers: 1024,
            command_buffer: 1024,
        }
    }
}

impl HubConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_peers == 0 {
            return Err(ConfigError::invalid("hub.max_peers", 0, "at least 1"));
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::invalid("hub.command_buffer", 0, "at least 1"));
        }
        Ok(())
    }
}

/// Per-peer queue, framing, and liveness settings.
///
/// When a file sets `read_timeout_secs` but not `ping_interval_secs`, the
/// ping interval is nine tenths of the configured read timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PeerConfigFile")]
pub struct PeerConfig {
    /// Capacity of each peer's outbound message queue.
    pub send_queue_capacity: usize,

    /// Largest inbound text frame accepted, in bytes.
    pub max_message_size: usize,

    /// Time allowed between any two inbound frames (application or pong).
    #[serde(rename = "read_timeout_secs", serialize_with = "serialize_secs")]
    pub read_timeout: Duration,

    /// Period of liveness pings. Must be less than `read_timeout`.
    #[serde(rename = "ping_interval_secs", serialize_with = "serialize_secs")]
    pub ping_interval: Duration,

    /// Time allowed for one outbound frame write.
    #[serde(rename = "write_timeout_secs", serialize_with = "serialize_secs")]
    pub write_timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        let read_timeout = Duration::from_secs(60);
        Self {
            send_queue_capacity: 256,
            max_message_size: 512,
            read_timeout,
            ping_interval: read_timeout * 9 / 10,
            write_timeout: Duration::from_secs(10),
        }
    }
}

impl PeerConfig {
    /// Builds a config with the given read deadline and a ping interval of
    /// nine tenths of it.
    pub fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            read_timeout,
            ping_interval: read_timeout * 9 / 10,
            ..Self::default()
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.send_queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "peer.send_queue_capacity",
                0,
                "at least 1",
            ));
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::invalid(
                "peer.max_message_size",
                0,
                "at least 1",
            ));
        }
        if self.read_timeout.is_zero() || self.write_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "peer timeouts",
                format!(
                    "read={:?} write={:?}",
                    self.read_timeout, self.write_timeout
                ),
                "non-zero durations",
            ));
        }
        if self.ping_interval.is_zero() || self.ping_interval >= self.read_timeout {
            return Err(ConfigError::invalid(
                "peer.ping_interval_secs",
                format!("{:?}", self.ping_interval),
                format!("non-zero and less than read timeout {:?}", self.read_timeout),
            ));
        }
        Ok(())
    }
}

/// `[peer]` as written in a config file. Absent keys fall back to defaults.
#[derive(Debug, Default, Deserialize)]
struct PeerConfigFile {
    send_queue_capacity: Option<usize>,
    max_message_size: Option<usize>,
    read_timeout_secs: Option<u64>,
    ping_interval_secs: Option<u64>,
    write_timeout_secs: Option<u64>,
}

impl From<PeerConfigFile> for PeerConfig {
    fn from(file: PeerConfigFile) -> Self {
        let base = file
            .read_timeout_secs
            .map(|secs| Self::with_read_timeout(Duration::from_secs(secs)))
            .unwrap_or_default();

        Self {
            send_queue_capacity: file.send_queue_capacity.unwrap_or(base.send_queue_capacity),
            max_message_size: file.max_message_size.unwrap_or(base.max_message_size),
            read_timeout: base.read_timeout,
            ping_interval: file
                .ping_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(base.ping_interval),
            write_timeout: file
                .write_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.write_timeout),
        }
    }
}

/// Serializes a `Duration` as whole seconds.
fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = RelayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr, ":8080");
        assert_eq!(config.peer.send_queue_capacity, 256);
        assert_eq!(config.peer.max_message_size, 512);
        assert_eq!(config.peer.read_timeout, Duration::from_secs(60));
        assert_eq!(config.peer.ping_interval, Duration::from_secs(54));
        assert_eq!(config.peer.write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_bind_addr_expands_bare_port() {
        let mut config = RelayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");

        config.listen_addr = "127.0.0.1:9000".to_string();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_ping_must_be_shorter_than_read_timeout() {
        let mut config = RelayConfig::default();
        config.peer.ping_interval = config.peer.read_timeout;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("peer.ping_interval_secs"));
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut config = RelayConfig::default();
        config.peer.send_queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFieldValue { .. })
        ));
    }

    #[test]
    fn test_with_read_timeout_keeps_ping_inside_deadline() {
        let peer = PeerConfig::with_read_timeout(Duration::from_millis(200));
        assert_eq!(peer.ping_interval, Duration::from_millis(180));
        assert!(peer.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "listen_addr = \"127.0.0.1:9999\"\n[peer]\nread_timeout_secs = 30\nping_interval_secs = 20"
        )
        .unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9999");
        assert_eq!(config.peer.read_timeout, Duration::from_secs(30));
        assert_eq!(config.peer.ping_interval, Duration::from_secs(20));
        assert_eq!(config.peer.send_queue_capacity, 256);
        assert_eq!(config.hub.max_peers, 1024);
    }

    #[test]
    fn test_load_read_timeout_alone_derives_ping() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[peer]\nread_timeout_secs = 30").unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.peer.read_timeout, Duration::from_secs(30));
        assert_eq!(config.peer.ping_interval, Duration::from_secs(27));
        assert_eq!(config.peer.write_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_empty_peer_table_uses_defaults() {
        let config: RelayConfig = toml::from_str("[peer]").unwrap();
        assert_eq!(config.peer, PeerConfig::default());
    }

    #[test]
    fn test_serialized_config_loads_back() {
        let mut config = RelayConfig::default();
        config.peer = PeerConfig::with_read_timeout(Duration::from_secs(20));

        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("read_timeout_secs = 20"));
        assert_eq!(toml::from_str::<RelayConfig>(&text).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[peer]\nread_timeout_secs = 5\nping_interval_secs = 10").unwrap();

        let err = RelayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFieldValue { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RelayConfig::load(Path::new("/nonexistent/relay.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/relay.toml"));
    }

    #[test]
    fn test_load_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen_addr = [").unwrap();

        let err = RelayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
