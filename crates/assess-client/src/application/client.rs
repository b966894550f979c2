//! The public chat client.
//!
//! [`ChatClient`] is a thin handle.  Every call enqueues an [`Input`] for a
//! driver task that owns the [`ConnectionManager`]; nothing here blocks or
//! touches the network directly.  Inbound frames are decoded and fanned out
//! by the [`EventDispatcher`] on that same driver task, so subscriber
//! callbacks never run concurrently with each other.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use assess_core::{AssessmentReport, ChatMessage};

use crate::application::connection::{ConnectionManager, Input, Transport};
use crate::application::dispatcher::EventDispatcher;
use crate::domain::{ClientConfig, ConfigError, ConnectionState, LifecycleEvent};
use crate::infrastructure::transport::WsTransport;

/// Client for the speech-assessment chat server.
///
/// Must be created inside a tokio runtime.  Dropping the client stops its
/// driver task, which cancels both timers and closes the link; use
/// [`ChatClient::shutdown`] to wait for that to finish.
///
/// # Example
///
/// ```rust,no_run
/// use assess_client::{ChatClient, ClientConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ChatClient::new(ClientConfig::default())?;
/// client.on_message(|msg| println!("{} {}", msg.kind.label(), msg.text));
/// client.on_assessment(|report| println!("{}", report.text));
/// client.connect();
/// client.send("你好");
/// client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    inputs: mpsc::UnboundedSender<Input>,
    dispatcher: Arc<EventDispatcher>,
    state: watch::Receiver<ConnectionState>,
    driver: JoinHandle<()>,
}

impl ChatClient {
    /// Creates a client that talks WebSocket to `config.server_url`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_transport(config, Arc::new(WsTransport::new()))
    }

    /// Creates a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `config` fails validation.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let dispatcher = Arc::new(EventDispatcher::new());
        let (inputs, inputs_rx) = mpsc::unbounded_channel();
        let (manager, state) =
            ConnectionManager::new(config, transport, Arc::clone(&dispatcher), inputs.clone());
        let driver = tokio::spawn(drive(manager, Arc::clone(&dispatcher), inputs_rx));

        Ok(Self {
            inputs,
            dispatcher,
            state,
            driver,
        })
    }

    /// Opens the connection.  No-op while connecting or connected.
    pub fn connect(&self) {
        self.enqueue(Input::Connect);
    }

    /// Closes the connection and cancels any pending reconnect.
    pub fn disconnect(&self) {
        self.enqueue(Input::Disconnect);
    }

    /// Sends one text frame.  Silently dropped unless connected.
    pub fn send(&self, text: impl Into<String>) {
        self.enqueue(Input::Send(text.into()));
    }

    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        self.dispatcher.on_message(callback);
    }

    pub fn on_assessment<F>(&self, callback: F)
    where
        F: Fn(&AssessmentReport) + Send + Sync + 'static,
    {
        self.dispatcher.on_assessment(callback);
    }

    pub fn on_lifecycle<F>(&self, callback: F)
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        self.dispatcher.on_lifecycle(callback);
    }

    /// The state as of the last input the driver processed.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Disconnects, then waits for the driver task to stop.
    pub async fn shutdown(mut self) {
        self.enqueue(Input::Shutdown);
        if let Err(e) = (&mut self.driver).await {
            if !e.is_cancelled() {
                warn!("client driver ended abnormally: {e}");
            }
        }
    }

    fn enqueue(&self, input: Input) {
        if self.inputs.send(input).is_err() {
            debug!("client driver has stopped, input dropped");
        }
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Driver loop: the one place the manager runs.
async fn drive(
    mut manager: ConnectionManager,
    dispatcher: Arc<EventDispatcher>,
    mut inputs: mpsc::UnboundedReceiver<Input>,
) {
    while let Some(input) = inputs.recv().await {
        let stop = matches!(input, Input::Shutdown);
        if let Some(frame) = manager.handle(input) {
            dispatcher.handle_frame(&frame);
        }
        if stop {
            debug!("client driver stopping");
            break;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::transport::RecordingTransport;
    use std::time::Duration;

    fn client(transport: &RecordingTransport) -> ChatClient {
        ChatClient::with_transport(ClientConfig::default(), Arc::new(transport.clone()))
            .expect("default config is valid")
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ClientConfig {
            server_url: "http://localhost:8765".into(),
            ..Default::default()
        };

        let result = ChatClient::with_transport(config, Arc::new(RecordingTransport::new()));

        assert!(matches!(result, Err(ConfigError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_zero_heartbeat_is_rejected() {
        let config = ClientConfig {
            heartbeat_interval: Duration::ZERO,
            ..Default::default()
        };

        let result = ChatClient::with_transport(config, Arc::new(RecordingTransport::new()));

        assert!(matches!(result, Err(ConfigError::ZeroDuration { .. })));
    }

    #[tokio::test]
    async fn test_new_client_starts_disconnected() {
        let transport = RecordingTransport::new();
        let client = client(&transport);

        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(transport.open_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_reaches_transport_through_driver() {
        // Arrange
        let transport = RecordingTransport::new();
        let client = client(&transport);
        let mut states = client.state_changes();

        // Act
        client.connect();
        states.changed().await.expect("driver alive");

        // Assert
        assert_eq!(*states.borrow(), ConnectionState::Connecting);
        assert_eq!(transport.opened_urls(), vec!["ws://localhost:8765".to_string()]);
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_link() {
        let transport = RecordingTransport::new();
        let client = client(&transport);
        client.connect();

        client.shutdown().await;

        assert_eq!(transport.open_count(), 1);
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_without_connect_is_quiet() {
        let transport = RecordingTransport::new();
        let client = client(&transport);

        client.shutdown().await;

        assert_eq!(transport.open_count(), 0);
        assert_eq!(transport.close_count(), 0);
    }
}
