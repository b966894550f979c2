//! Client configuration types.
//!
//! [`ClientConfig`] is the single source of truth for runtime settings.  It
//! can be built from defaults (local development against the bundled Python
//! server), a TOML file, or command-line flags.  The infrastructure layer is
//! responsible for reading those sources; this module only holds the values
//! and checks them.

use std::time::Duration;

use thiserror::Error;

/// Default assessment server address (the Python server listens on 8765).
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8765";
/// Default period between heartbeat pings.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// Default wait before the single reconnect attempt after a close.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Longest accepted heartbeat interval or reconnect delay.
pub const MAX_TIMER_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors produced when a configuration value is unusable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The server URL does not use a WebSocket scheme.
    #[error("server URL must start with ws:// or wss://, got '{0}'")]
    InvalidUrl(String),

    /// A timer duration is zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending setting.
        field: &'static str,
    },

    /// A timer duration exceeds [`MAX_TIMER_DURATION`].
    #[error("{field} must not exceed {max:?}")]
    DurationTooLong {
        field: &'static str,
        max: Duration,
    },
}

/// All runtime configuration for the chat client.
///
/// # Example
///
/// ```rust
/// use assess_client::domain::ClientConfig;
///
/// let cfg = ClientConfig::default();
/// assert_eq!(cfg.server_url, "ws://localhost:8765");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the assessment server, e.g. `ws://host:port`.
    pub server_url: String,

    /// How often a `{"type":"ping"}` is sent while connected.
    pub heartbeat_interval: Duration,

    /// How long to wait after a close before reconnecting once.
    pub reconnect_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ClientConfig {
    /// Checks that the configuration can drive a connection.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] for a non-WebSocket URL or one
    /// with surrounding whitespace, [`ConfigError::ZeroDuration`] for a zero
    /// heartbeat interval or reconnect delay, and
    /// [`ConfigError::DurationTooLong`] when either exceeds
    /// [`MAX_TIMER_DURATION`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.server_url.as_str();
        let has_ws_scheme = ["ws://", "wss://"]
            .iter()
            .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme));
        if !has_ws_scheme || url.trim() != url {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        check_timer("heartbeat_interval", self.heartbeat_interval)?;
        check_timer("reconnect_delay", self.reconnect_delay)
    }
}

fn check_timer(field: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::ZeroDuration { field });
    }
    if value > MAX_TIMER_DURATION {
        return Err(ConfigError::DurationTooLong {
            field,
            max: MAX_TIMER_DURATION,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
