//! Configuration file parsing
//!
//! Parses TOML configuration files for the AoE server, as an alternative to
//! command-line flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::{BROADCAST_MAJOR, BROADCAST_MINOR};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub device: DeviceConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Network interface to serve on.
    pub interface: String,

    /// Shelf (major) address.
    pub shelf: u16,

    /// Slot (minor) address.
    pub slot: u8,

    /// Seconds between discovery broadcasts. Zero disables them.
    #[serde(default = "default_advertise_secs")]
    pub advertise_secs: u64,

    /// Outstanding messages advertised to initiators.
    #[serde(default = "default_buffer_count")]
    pub buffer_count: u16,

    /// Firmware version advertised to initiators.
    #[serde(default = "default_firmware_version")]
    pub firmware_version: u16,

    /// Maximum sectors per ATA request advertised to initiators.
    #[serde(default = "default_sector_count")]
    pub sector_count: u8,

    /// Config string answered to discovery queries.
    #[serde(default)]
    pub config_string: String,
}

fn default_advertise_secs() -> u64 {
    60
}

fn default_buffer_count() -> u16 {
    16
}

fn default_firmware_version() -> u16 {
    1
}

fn default_sector_count() -> u8 {
    2
}

/// `[device]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    pub backend: BackendKind,

    /// Backing file or block device (file backend).
    pub path: Option<PathBuf>,

    /// Create or extend the backing file to this many bytes
    /// (file backend).
    pub size: Option<u64>,

    /// Serve the device read-only.
    #[serde(default)]
    pub read_only: bool,

    /// Device size in sectors (ram backend).
    pub ram_sectors: Option<u64>,
}

/// Backing store kind.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    File,
    Ram,
}

impl Config {
    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.shelf == BROADCAST_MAJOR {
            return Err(ConfigError::Invalid(format!(
                "shelf {:#06X} is the broadcast wildcard",
                BROADCAST_MAJOR
            )));
        }
        if self.server.slot == BROADCAST_MINOR {
            return Err(ConfigError::Invalid(format!(
                "slot {:#04X} is the broadcast wildcard",
                BROADCAST_MINOR
            )));
        }

        if self.server.config_string.len() > 1024 {
            return Err(ConfigError::Invalid(
                "config string longer than 1024 bytes".to_string(),
            ));
        }

        match self.device.backend {
            BackendKind::File => {
                if self.device.path.is_none() {
                    return Err(ConfigError::Invalid(
                        "file backend requires device.path".to_string(),
                    ));
                }
            }
            BackendKind::Ram => {
                if self.device.ram_sectors.is_none() {
                    return Err(ConfigError::Invalid(
                        "ram backend requires device.ram_sectors".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}
