//! Connection configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via HLNET_CONFIG)
//! 3. Environment variables

use hlnet_channel::{QosType, MAX_FRAGMENT_OVERHEAD};
use hlnet_protocol::MAX_FRAME_PAYLOAD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest accepted packet size.
pub const MIN_PACKET_SIZE: usize = 128;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel layout and packet sizes.
    pub topology: TopologyConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
    /// Connect-time fingerprint check.
    pub fingerprint: FingerprintConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("HLNET_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.topology.apply_env_overrides();
        self.logging.apply_env_overrides();
        self.fingerprint.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.topology.validate()
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Channel layout shared by every connection of a host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Packet ceiling for every channel, in bytes.
    pub packet_size: usize,
    /// Chunk size on fragmented channels, which accept `fragment_size * 128`
    /// bytes per send.
    pub fragment_size: usize,
    /// Coalescing delay in milliseconds (0 = send immediately).
    pub max_delay_ms: u64,
    /// QoS class of each channel, indexed by channel id.
    pub channels: Vec<QosType>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            packet_size: 1440,
            fragment_size: 500,
            max_delay_ms: 0,
            channels: vec![QosType::ReliableSequenced, QosType::Unreliable],
        }
    }
}

impl TopologyConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(size) = std::env::var("HLNET_PACKET_SIZE") {
            if let Ok(n) = size.parse() {
                self.packet_size = n;
            }
        }

        if let Ok(size) = std::env::var("HLNET_FRAGMENT_SIZE") {
            if let Ok(n) = size.parse() {
                self.fragment_size = n;
            }
        }

        if let Ok(delay) = std::env::var("HLNET_MAX_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                self.max_delay_ms = ms;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one channel is required".to_string(),
            ));
        }
        if self.channels.len() > usize::from(u8::MAX) {
            return Err(ConfigError::ValidationError(format!(
                "too many channels: {} (max {})",
                self.channels.len(),
                u8::MAX
            )));
        }
        if self.packet_size < MIN_PACKET_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "packet_size {} is below the minimum of {}",
                self.packet_size, MIN_PACKET_SIZE
            )));
        }
        if self.packet_size > MAX_FRAME_PAYLOAD {
            return Err(ConfigError::ValidationError(format!(
                "packet_size {} exceeds the frame limit of {}",
                self.packet_size, MAX_FRAME_PAYLOAD
            )));
        }
        if self.fragment_size == 0 {
            return Err(ConfigError::ValidationError(
                "fragment_size must be non-zero".to_string(),
            ));
        }
        if self.fragment_size + MAX_FRAGMENT_OVERHEAD > self.packet_size {
            return Err(ConfigError::ValidationError(format!(
                "fragment_size {} plus {} bytes of framing exceeds packet_size {}",
                self.fragment_size, MAX_FRAGMENT_OVERHEAD, self.packet_size
            )));
        }
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log every sent and received frame with a hex dump of its payload.
    pub log_network_messages: bool,
}

impl LoggingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("HLNET_LOG_MESSAGES") {
            self.log_network_messages = enabled == "1" || enabled.to_lowercase() == "true";
        }
    }
}

/// Fingerprint check configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Reject peers whose fingerprint does not match (otherwise only warn).
    pub script_crc_check: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            script_crc_check: true,
        }
    }
}

impl FingerprintConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("HLNET_CRC_CHECK") {
            self.script_crc_check = enabled == "1" || enabled.to_lowercase() == "true";
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.topology.packet_size, 1440);
        assert_eq!(config.topology.fragment_size, 500);
        assert_eq!(config.topology.max_delay(), Duration::ZERO);
        assert_eq!(
            config.topology.channels,
            vec![QosType::ReliableSequenced, QosType::Unreliable]
        );
        assert!(!config.logging.log_network_messages);
        assert!(config.fingerprint.script_crc_check);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fragment_size_must_fit_packet() {
        let mut topology = TopologyConfig {
            fragment_size: 1440 - MAX_FRAGMENT_OVERHEAD,
            ..Default::default()
        };
        assert!(topology.validate().is_ok());

        topology.fragment_size += 1;
        let err = topology.validate().unwrap_err();
        assert!(err.to_string().contains("fragment_size 1429"));

        topology.fragment_size = 100;
        topology.packet_size = MAX_FRAME_PAYLOAD + 1;
        assert!(topology.validate().is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut topology = TopologyConfig {
            channels: vec![],
            ..Default::default()
        };
        assert!(matches!(
            topology.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        topology.channels = vec![QosType::Unreliable; 256];
        assert!(topology.validate().is_err());

        topology.channels = vec![QosType::Unreliable; 255];
        assert!(topology.validate().is_ok());

        topology.packet_size = 64;
        let err = topology.validate().unwrap_err();
        assert!(err.to_string().contains("packet_size 64"));

        topology.packet_size = 1440;
        topology.fragment_size = 0;
        assert!(topology.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.topology.channels.push(QosType::ReliableFragmented);
        config.topology.max_delay_ms = 25;
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("reliable_fragmented"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.topology.channels, config.topology.channels);
        assert_eq!(parsed.topology.max_delay_ms, 25);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("logging:\n  log_network_messages: true\n").unwrap();
        assert!(parsed.logging.log_network_messages);
        assert_eq!(parsed.topology.packet_size, 1440);
        assert!(parsed.fingerprint.script_crc_check);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hlnet.yaml");

        let mut config = Config::default();
        config.topology.channels = vec![QosType::Reliable, QosType::StateUpdate];
        config.fingerprint.script_crc_check = false;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.topology.channels, config.topology.channels);
        assert!(!loaded.fingerprint.script_crc_check);
    }

    #[test]
    fn test_missing_and_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            Config::from_file(&missing),
            Err(ConfigError::IoError(..))
        ));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "topology: [not, a, map]").unwrap();
        let err = Config::from_file(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
        assert!(err.to_string().contains("bad.yaml"));
    }
}
