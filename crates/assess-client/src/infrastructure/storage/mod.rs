//! Persistent settings.

pub mod config_file;

pub use config_file::{load_config, parse_config, to_toml, ConfigFile, ConfigFileError};
