//! Connection state and lifecycle notifications.

use std::fmt;
use std::time::Duration;

/// Where the single server connection currently stands.
///
/// Only the connection manager changes this value.  Everyone else observes it
/// through [`LifecycleEvent::StateChanged`] or a watch receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No link exists.
    #[default]
    Disconnected,
    /// A link has been opened and the handshake is in progress.
    Connecting,
    /// The handshake completed; heartbeats are running.
    Connected,
    /// A client-initiated close is being carried out.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
        };
        f.write_str(name)
    }
}

/// Notifications about the connection, delivered to lifecycle subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The state machine moved to a new state.
    StateChanged(ConnectionState),
    /// Opening the connection failed.  No automatic retry follows.
    ConnectionError(String),
    /// The server side of an established connection went away.
    Closed {
        /// WebSocket close code (1006 when no close frame was received).
        code: u16,
        /// Close reason text, possibly empty.
        reason: String,
        /// Whether a close handshake took place.
        was_clean: bool,
    },
    /// A single reconnect attempt will be made after `delay`.
    ReconnectScheduled {
        /// Wait before the attempt.
        delay: Duration,
    },
}
