//! TOML configuration file.
//!
//! Every key is optional; a missing key keeps its built-in default:
//!
//! ```toml
//! server_url = "ws://localhost:8765"
//! heartbeat_interval_secs = 30
//! reconnect_delay_secs = 5
//! ```
//!
//! Durations are whole seconds on disk and [`std::time::Duration`] in
//! [`ClientConfig`].  Loaded values are validated before they are returned,
//! and a config holding a fractional-second duration cannot be rendered.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::config::{
    ClientConfig, ConfigError, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_RECONNECT_DELAY,
    DEFAULT_SERVER_URL,
};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file parsed but holds unusable values.
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),

    /// A duration has a sub-second part the file format cannot hold.
    #[error("{field} is {value:?}, but config files store whole seconds")]
    FractionalSeconds { field: &'static str, value: Duration },
}

// ── Schema ────────────────────────────────────────────────────────────────────

/// On-disk shape of [`ClientConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_heartbeat_interval_secs() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL.as_secs()
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_secs()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

impl From<ConfigFile> for ClientConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            server_url: file.server_url,
            heartbeat_interval: Duration::from_secs(file.heartbeat_interval_secs),
            reconnect_delay: Duration::from_secs(file.reconnect_delay_secs),
        }
    }
}

impl TryFrom<&ClientConfig> for ConfigFile {
    type Error = ConfigFileError;

    fn try_from(config: &ClientConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            server_url: config.server_url.clone(),
            heartbeat_interval_secs: whole_secs("heartbeat_interval", config.heartbeat_interval)?,
            reconnect_delay_secs: whole_secs("reconnect_delay", config.reconnect_delay)?,
        })
    }
}

fn whole_secs(field: &'static str, value: Duration) -> Result<u64, ConfigFileError> {
    if value.subsec_nanos() != 0 {
        return Err(ConfigFileError::FractionalSeconds { field, value });
    }
    Ok(value.as_secs())
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates TOML text.
///
/// # Errors
///
/// [`ConfigFileError::Parse`] for malformed TOML or unknown keys,
/// [`ConfigFileError::Invalid`] when a value fails validation.
pub fn parse_config(text: &str) -> Result<ClientConfig, ConfigFileError> {
    let file: ConfigFile = toml::from_str(text)?;
    let config = ClientConfig::from(file);
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates the file at `path`.
///
/// A missing file is an error: the path was asked for explicitly.
///
/// # Errors
///
/// [`ConfigFileError::Io`] when the file cannot be read, otherwise as
/// [`parse_config`].
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text)
}

/// Renders `config` in the file format, e.g. for `--print-config`.
///
/// # Errors
///
/// [`ConfigFileError::FractionalSeconds`] if a duration is not a whole
/// number of seconds, [`ConfigFileError::Serialize`] if TOML serialization
/// fails.
pub fn to_toml(config: &ClientConfig) -> Result<String, ConfigFileError> {
    Ok(toml::to_string_pretty(&ConfigFile::try_from(config)?)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
