use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SUPPORTED_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: u8,
    #[serde(default)]
    pub wireguard: WireguardConfig,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct WireguardConfig {
    #[serde(default = "default_interface")]
    pub interface: String,
    // seconds, pushed to peers after a successful punch
    #[serde(default = "default_persistent_keepalive")]
    pub persistent_keepalive: u16,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("error deserializing config: {0}")]
    Deserialization(#[from] toml::de::Error),
    #[error("unsupported config version: {0}")]
    VersionMismatch(u8),
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub fn path() -> PathBuf {
    PathBuf::from("/etc/natpunch/config.toml")
}

pub fn default_interface() -> String {
    "wg0".to_string()
}

pub fn default_persistent_keepalive() -> u16 {
    25
}

/// Reads the config at `path`, falling back to defaults when the file does not exist.
pub fn read(path: &Path) -> Result<Config, Error> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        Err(e) => return Err(Error::IO(e)),
    };
    content.parse()
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(s)?;
        if config.version != SUPPORTED_VERSION {
            return Err(Error::VersionMismatch(config.version));
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version: SUPPORTED_VERSION,
            wireguard: WireguardConfig::default(),
        }
    }
}

impl Default for WireguardConfig {
    fn default() -> Self {
        WireguardConfig {
            interface: default_interface(),
            persistent_keepalive: default_persistent_keepalive(),
        }
    }
}
