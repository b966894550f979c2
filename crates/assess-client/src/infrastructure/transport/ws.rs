//! WebSocket transport built on tokio-tungstenite.
//!
//! Every call to [`WsTransport::open`] spawns one link task.  The task runs
//! the handshake, then multiplexes two directions with `tokio::select!`:
//!
//! ```text
//!  WsLink::send_text ──► outbound channel ──► sink ──► server
//!  TransportEvents   ◄── stream ◄──────────────────── server
//! ```
//!
//! How each outcome is reported:
//!
//! | What happened                    | Reported as                              |
//! |----------------------------------|------------------------------------------|
//! | handshake failed                 | `error(reason)`                          |
//! | handshake completed              | `opened()`                               |
//! | text frame received              | `message(text)`                          |
//! | Close frame received             | `closed(code, reason, was_clean = true)` |
//! | stream ended or read error       | `closed(1006, .., was_clean = false)`    |
//! | `WsLink::close` or link dropped  | Close frame (1000) sent, then `closed`   |
//!
//! Protocol-level pings are answered by tungstenite itself; the application
//! heartbeat is a JSON text frame sent by the connection manager.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::{debug, trace, warn};

use crate::application::connection::{Link, Transport, TransportEvents};

/// Close code used when no close frame was received.
pub const ABNORMAL_CLOSURE: u16 = 1006;
/// Close code reported for a Close frame without a status.
pub const NO_STATUS_RECEIVED: u16 = 1005;
/// Close code and reason of a client-initiated close.
pub const CLIENT_CLOSE_CODE: u16 = 1000;
pub const CLIENT_CLOSE_REASON: &str = "client disconnect";

/// Opens real WebSocket connections.
///
/// Must be used inside a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl WsTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WsTransport {
    fn open(&self, url: &str, events: TransportEvents) -> Box<dyn Link> {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_link(url.to_string(), outbound_rx, events));
        Box::new(WsLink {
            outbound: outbound_tx,
        })
    }
}

/// Commands from the connection manager to the link task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Sending half handed to the connection manager.
///
/// Dropping it has the same effect as [`Link::close`].
struct WsLink {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl Link for WsLink {
    fn send_text(&mut self, text: String) {
        if self.outbound.send(Outbound::Text(text)).is_err() {
            debug!("link task has ended, frame dropped");
        }
    }

    fn close(&mut self) {
        // The task may already be gone if the server closed first.
        let _ = self.outbound.send(Outbound::Close);
    }
}

// ── Link task ─────────────────────────────────────────────────────────────────

async fn run_link(
    url: String,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: TransportEvents,
) {
    let session = events.session();
    debug!("session {session}: opening WebSocket to {url}");

    // A close requested during the handshake abandons the attempt.
    let handshake = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = outbound.recv() => {
            debug!("session {session}: connect abandoned before handshake completed");
            return;
        }
    };

    let ws_stream = match handshake {
        Ok((stream, response)) => {
            debug!(
                "session {session}: handshake complete (HTTP {})",
                response.status()
            );
            stream
        }
        Err(e) => {
            events.error(e.to_string());
            return;
        }
    };
    events.opened();

    let (mut sink, mut stream) = ws_stream.split();
    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    trace!("session {session}: → {text}");
                    if let Err(e) = sink.send(WsMessage::Text(text)).await {
                        // The read side observes the broken connection and
                        // reports the close.
                        warn!("session {session}: WebSocket send failed: {e}");
                    }
                }
                Some(Outbound::Close) | None => {
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: CLIENT_CLOSE_REASON.into(),
                    };
                    if let Err(e) = sink.send(WsMessage::Close(Some(frame))).await {
                        debug!("session {session}: close frame not sent: {e}");
                    }
                    events.closed(CLIENT_CLOSE_CODE, CLIENT_CLOSE_REASON, true);
                    return;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    trace!("session {session}: ← {text}");
                    events.message(text);
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    debug!("session {session}: Close frame received ({code})");
                    // Flushes tungstenite's queued close reply.
                    let _ = sink.close().await;
                    events.closed(code, reason, true);
                    return;
                }
                Some(Ok(WsMessage::Binary(data))) => {
                    warn!(
                        "session {session}: unexpected binary frame ({} bytes) ignored",
                        data.len()
                    );
                }
                Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {
                    trace!("session {session}: WebSocket control frame");
                }
                Some(Ok(WsMessage::Frame(_))) => {
                    debug!("session {session}: raw frame ignored");
                }
                Some(Err(e)) => {
                    let reason = match e {
                        WsError::ConnectionClosed | WsError::AlreadyClosed => {
                            "connection closed".to_string()
                        }
                        other => other.to_string(),
                    };
                    events.closed(ABNORMAL_CLOSURE, reason, false);
                    return;
                }
                None => {
                    events.closed(ABNORMAL_CLOSURE, "stream ended", false);
                    return;
                }
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
