//! Connection state machine.
//!
//! [`ConnectionManager`] owns the single link to the assessment server.  It
//! opens the link, keeps it alive with heartbeat pings, reconnects once after
//! the server closes an established connection, and tears everything down on
//! request.
//!
//! # Execution model
//!
//! The manager is not shared.  Exactly one driver task owns it and feeds it
//! [`Input`] values from one channel: facade commands, transport events,
//! heartbeat ticks, and reconnect firings all arrive there.  Transport events
//! and heartbeat ticks are tagged with the [`SessionId`] they belong to, and
//! reconnect firings with their [`TimerId`], so anything left over from an
//! earlier link or an earlier schedule is recognised and dropped.
//!
//! ```text
//!                 connect()
//!  Disconnected ─────────────► Connecting ──on_open──► Connected
//!       ▲  ▲                       │                      │
//!       │  └────on_error / close───┘                      │ on_close
//!       │                                                 ▼
//!       └──────── reconnect delay elapsed ◄──────── Disconnected
//!
//!  Connecting/Connected ──disconnect()──► Closing ──► Disconnected
//! ```

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use assess_core::{encode, Envelope};

use crate::application::dispatcher::EventDispatcher;
use crate::application::timer::{Timer, TimerId};
use crate::domain::{ClientConfig, ConnectionState, LifecycleEvent};

// ── Inputs ────────────────────────────────────────────────────────────────────

/// Identifies one opened link.  Incremented on every connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The WebSocket handshake completed.
    Opened,
    /// The link could not be established.
    Error(String),
    /// The link went away.
    Closed {
        code: u16,
        reason: String,
        was_clean: bool,
    },
    /// A text frame arrived.
    Message(String),
}

/// Everything the driver task feeds into the manager.
#[derive(Debug)]
pub enum Input {
    Connect,
    Disconnect,
    Send(String),
    /// Disconnect and stop the driver.
    Shutdown,
    Transport {
        session: SessionId,
        event: TransportEvent,
    },
    HeartbeatDue {
        session: SessionId,
    },
    ReconnectDue {
        timer: TimerId,
    },
}

// ── Transport seam ────────────────────────────────────────────────────────────

/// Handle a transport uses to report what happens on one link.
///
/// Every report is tagged with the session the link was opened for.  Reports
/// sent after the client has gone away are discarded.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    session: SessionId,
    inputs: mpsc::UnboundedSender<Input>,
}

impl TransportEvents {
    pub fn new(session: SessionId, inputs: mpsc::UnboundedSender<Input>) -> Self {
        Self { session, inputs }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn opened(&self) {
        self.emit(TransportEvent::Opened);
    }

    pub fn error(&self, reason: impl Into<String>) {
        self.emit(TransportEvent::Error(reason.into()));
    }

    pub fn closed(&self, code: u16, reason: impl Into<String>, was_clean: bool) {
        self.emit(TransportEvent::Closed {
            code,
            reason: reason.into(),
            was_clean,
        });
    }

    pub fn message(&self, text: impl Into<String>) {
        self.emit(TransportEvent::Message(text.into()));
    }

    fn emit(&self, event: TransportEvent) {
        let input = Input::Transport {
            session: self.session,
            event,
        };
        if self.inputs.send(input).is_err() {
            debug!("session {}: client is gone, transport event dropped", self.session);
        }
    }
}

/// Opens links to the server.
///
/// `open` must not block: it starts the connection attempt and returns at
/// once.  The outcome is reported later through `events`.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    fn open(&self, url: &str, events: TransportEvents) -> Box<dyn Link>;
}

/// The sending half of one opened link.
#[cfg_attr(test, mockall::automock)]
pub trait Link: Send {
    /// Queues one text frame.
    fn send_text(&mut self, text: String);

    /// Starts a client-initiated close.  No further events are expected to
    /// matter after this call.
    fn close(&mut self);
}

// ── ConnectionManager ─────────────────────────────────────────────────────────

/// Owns the link, the heartbeat timer, and the pending reconnect.
///
/// Invariant: `link` is `Some` exactly while the state is `Connecting` or
/// `Connected`, and `heartbeat` is `Some` only while `Connected`.
pub struct ConnectionManager {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    dispatcher: Arc<EventDispatcher>,
    inputs: mpsc::UnboundedSender<Input>,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    session: SessionId,
    link: Option<Box<dyn Link>>,
    heartbeat: Option<Timer>,
    reconnect: Option<Timer>,
    next_timer_id: u64,
}

impl ConnectionManager {
    /// Creates a disconnected manager.
    ///
    /// `inputs` must feed the same channel the owner drains into
    /// [`ConnectionManager::handle`]; timers and transports post into it.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        dispatcher: Arc<EventDispatcher>,
        inputs: mpsc::UnboundedSender<Input>,
    ) -> (Self, watch::Receiver<ConnectionState>) {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let manager = Self {
            config,
            transport,
            dispatcher,
            inputs,
            state: ConnectionState::Disconnected,
            state_tx,
            session: SessionId::default(),
            link: None,
            heartbeat: None,
            reconnect: None,
            next_timer_id: 0,
        };
        (manager, state_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The session of the most recently opened link.
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Processes one input.
    ///
    /// Returns the raw text of an inbound frame on the live session; the
    /// caller hands it to the dispatcher.
    pub fn handle(&mut self, input: Input) -> Option<String> {
        match input {
            Input::Connect => self.connect(),
            Input::Disconnect | Input::Shutdown => self.disconnect(),
            Input::Send(text) => self.send(text),
            Input::Transport { session, event } => {
                return self.on_transport_event(session, event);
            }
            Input::HeartbeatDue { session } => self.on_heartbeat_due(session),
            Input::ReconnectDue { timer } => self.on_reconnect_due(timer),
        }
        None
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// Opens a new link unless one is already open or opening.
    pub fn connect(&mut self) {
        if self.link.is_some() {
            debug!("connect ignored: already {}", self.state);
            return;
        }
        if let Some(timer) = self.reconnect.take() {
            debug!("explicit connect supersedes the pending reconnect");
            timer.cancel();
        }

        self.session = SessionId(self.session.0 + 1);
        info!("session {}: connecting to {}", self.session, self.config.server_url);
        let events = TransportEvents::new(self.session, self.inputs.clone());
        self.link = Some(self.transport.open(&self.config.server_url, events));
        self.transition(ConnectionState::Connecting);
    }

    /// Closes the link and cancels every timer.  Never triggers a reconnect.
    pub fn disconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            debug!("pending reconnect cancelled");
            timer.cancel();
        }
        self.stop_heartbeat();

        let Some(mut link) = self.link.take() else {
            debug!("disconnect ignored: already disconnected");
            return;
        };
        info!("session {}: closing connection", self.session);
        self.transition(ConnectionState::Closing);
        link.close();
        self.transition(ConnectionState::Disconnected);
    }

    /// Sends `text` as one frame while connected; drops it otherwise.
    pub fn send(&mut self, text: String) {
        match self.link.as_mut() {
            Some(link) if self.state == ConnectionState::Connected => link.send_text(text),
            _ => debug!("send dropped: connection is {}", self.state),
        }
    }

    // ── Transport events ──────────────────────────────────────────────────────

    fn on_transport_event(&mut self, session: SessionId, event: TransportEvent) -> Option<String> {
        if session != self.session || self.link.is_none() {
            debug!(
                "session {session}: stale transport event ignored (current session {})",
                self.session
            );
            return None;
        }
        match event {
            TransportEvent::Opened => self.on_open(),
            TransportEvent::Error(reason) => self.on_error(reason),
            TransportEvent::Closed {
                code,
                reason,
                was_clean,
            } => self.on_close(code, reason, was_clean),
            TransportEvent::Message(text) => {
                if self.state == ConnectionState::Connected {
                    return Some(text);
                }
                debug!("session {session}: frame before handshake completed ignored");
            }
        }
        None
    }

    fn on_open(&mut self) {
        if self.state != ConnectionState::Connecting {
            debug!("session {}: duplicate open ignored", self.session);
            return;
        }
        info!("session {}: connected to {}", self.session, self.config.server_url);
        self.start_heartbeat();
        self.transition(ConnectionState::Connected);
    }

    fn on_error(&mut self, reason: String) {
        if self.state != ConnectionState::Connecting {
            // An established link reports its end through a close.
            warn!("session {}: transport error: {reason}", self.session);
            return;
        }
        error!(
            "session {}: could not connect to {}: {reason}",
            self.session, self.config.server_url
        );
        self.link = None;
        self.dispatcher
            .publish_lifecycle(&LifecycleEvent::ConnectionError(reason));
        self.transition(ConnectionState::Disconnected);
    }

    fn on_close(&mut self, code: u16, reason: String, was_clean: bool) {
        match self.state {
            ConnectionState::Connecting => {
                self.on_error(format!("closed during handshake (code {code}: {reason})"));
            }
            ConnectionState::Connected => {
                warn!(
                    "session {}: connection closed (code: {code}, reason: {reason:?}, clean: {was_clean})",
                    self.session
                );
                self.stop_heartbeat();
                self.link = None;
                self.dispatcher.publish_lifecycle(&LifecycleEvent::Closed {
                    code,
                    reason,
                    was_clean,
                });
                self.transition(ConnectionState::Disconnected);
                self.schedule_reconnect();
            }
            ConnectionState::Closing | ConnectionState::Disconnected => {
                debug!("session {}: close ignored while {}", self.session, self.state);
            }
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────────

    fn on_heartbeat_due(&mut self, session: SessionId) {
        if session != self.session || self.state != ConnectionState::Connected {
            debug!("session {session}: stale heartbeat ignored");
            return;
        }
        match encode(&Envelope::ping()) {
            Ok(frame) => {
                debug!("session {session}: sending heartbeat");
                self.send(frame);
            }
            Err(e) => error!("could not encode heartbeat: {e}"),
        }
    }

    fn on_reconnect_due(&mut self, timer: TimerId) {
        match self.reconnect.take() {
            Some(pending) if pending.id() == timer => {
                info!("reconnect delay elapsed, reconnecting");
                self.connect();
            }
            other => {
                self.reconnect = other;
                debug!("stale reconnect timer {timer:?} ignored");
            }
        }
    }

    fn start_heartbeat(&mut self) {
        let id = self.next_timer_id();
        let session = self.session;
        let inputs = self.inputs.clone();
        self.heartbeat = Some(Timer::repeating(
            id,
            self.config.heartbeat_interval,
            move || {
                let _ = inputs.send(Input::HeartbeatDue { session });
            },
        ));
    }

    fn stop_heartbeat(&mut self) {
        if let Some(timer) = self.heartbeat.take() {
            timer.cancel();
        }
    }

    fn schedule_reconnect(&mut self) {
        let id = self.next_timer_id();
        let delay = self.config.reconnect_delay;
        let inputs = self.inputs.clone();
        self.reconnect = Some(Timer::once(id, delay, move || {
            let _ = inputs.send(Input::ReconnectDue { timer: id });
        }));
        info!("reconnecting in {delay:?}");
        self.dispatcher
            .publish_lifecycle(&LifecycleEvent::ReconnectScheduled { delay });
    }

    fn next_timer_id(&mut self) -> TimerId {
        self.next_timer_id += 1;
        TimerId(self.next_timer_id)
    }

    // ── State ─────────────────────────────────────────────────────────────────

    /// The only place `state` changes.
    fn transition(&mut self, to: ConnectionState) {
        if self.state == to {
            return;
        }
        info!("connection state: {} -> {to}", self.state);
        self.state = to;
        self.state_tx.send_replace(to);
        self.dispatcher
            .publish_lifecycle(&LifecycleEvent::StateChanged(to));
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(mut link) = self.link.take() {
            debug!("session {}: manager dropped, closing link", self.session);
            link.close();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
