//! In-memory transport for tests.
//!
//! [`RecordingTransport`] never touches the network.  It records every URL it
//! was asked to open, every frame sent and every close, and keeps the
//! [`TransportEvents`] handle of each link so a test can play the server:
//!
//! ```ignore
//! let transport = RecordingTransport::new();
//! let client = ChatClient::with_transport(config, Arc::new(transport.clone()))?;
//! client.connect();
//!
//! // ...once the driver has processed the connect:
//! let server = transport.latest().unwrap();
//! server.opened();
//! server.message(r#"{"type":"ai_response","content":"你好"}"#);
//! ```
//!
//! Clones share one record, so the test keeps a clone for inspection and hands
//! another to the client.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::connection::{Link, Transport, TransportEvents};

#[derive(Debug, Default)]
struct Record {
    opened_urls: Vec<String>,
    links: Vec<TransportEvents>,
    sent: Vec<String>,
    closes: usize,
}

/// A transport that records traffic instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    record: Arc<Mutex<Record>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many links have been opened.
    pub fn open_count(&self) -> usize {
        self.lock().opened_urls.len()
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.lock().opened_urls.clone()
    }

    /// Every frame sent on any link, in order.
    pub fn sent_frames(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    /// How many client-initiated closes were requested.
    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    /// The event handle of the most recently opened link.
    pub fn latest(&self) -> Option<TransportEvents> {
        self.lock().links.last().cloned()
    }

    /// The event handle of the `index`-th opened link (zero-based).
    pub fn link(&self, index: usize) -> Option<TransportEvents> {
        self.lock().links.get(index).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for RecordingTransport {
    fn open(&self, url: &str, events: TransportEvents) -> Box<dyn Link> {
        let mut record = self.lock();
        record.opened_urls.push(url.to_string());
        record.links.push(events);
        Box::new(RecordingLink {
            record: Arc::clone(&self.record),
        })
    }
}

struct RecordingLink {
    record: Arc<Mutex<Record>>,
}

impl Link for RecordingLink {
    fn send_text(&mut self, text: String) {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .push(text);
    }

    fn close(&mut self) {
        self.record
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closes += 1;
    }
}
