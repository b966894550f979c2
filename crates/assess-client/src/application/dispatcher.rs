//! Turns decoded envelopes into chat lines and assessment reports.
//!
//! The dispatcher owns three observer lists (chat messages, assessment
//! reports, lifecycle notifications).  Fan-out is synchronous and ordered by
//! registration.  The list is cloned out of its lock before any callback runs,
//! so a callback may register further subscribers; those are first called for
//! the next event.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, trace, warn};

use assess_core::{decode, AssessmentReport, ChatMessage, Envelope, MessageType};

use crate::domain::LifecycleEvent;

/// Callback invoked for every chat line.
pub type MessageCallback = Arc<dyn Fn(&ChatMessage) + Send + Sync>;
/// Callback invoked for every assessment report.
pub type AssessmentCallback = Arc<dyn Fn(&AssessmentReport) + Send + Sync>;
/// Callback invoked for every lifecycle notification.
pub type LifecycleCallback = Arc<dyn Fn(&LifecycleEvent) + Send + Sync>;

/// What an inbound envelope means to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// A user, AI, or system line.
    MessageReceived(ChatMessage),
    /// A pronunciation assessment.
    AssessmentReceived(AssessmentReport),
}

/// Routes inbound envelopes and connection notifications to subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    message_subscribers: RwLock<Vec<MessageCallback>>,
    assessment_subscribers: RwLock<Vec<AssessmentCallback>>,
    lifecycle_subscribers: RwLock<Vec<LifecycleCallback>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Subscription ──────────────────────────────────────────────────────────

    pub fn on_message<F>(&self, callback: F)
    where
        F: Fn(&ChatMessage) + Send + Sync + 'static,
    {
        write_list(&self.message_subscribers).push(Arc::new(callback));
    }

    pub fn on_assessment<F>(&self, callback: F)
    where
        F: Fn(&AssessmentReport) + Send + Sync + 'static,
    {
        write_list(&self.assessment_subscribers).push(Arc::new(callback));
    }

    pub fn on_lifecycle<F>(&self, callback: F)
    where
        F: Fn(&LifecycleEvent) + Send + Sync + 'static,
    {
        write_list(&self.lifecycle_subscribers).push(Arc::new(callback));
    }

    // ── Inbound frames ────────────────────────────────────────────────────────

    /// Decodes one raw text frame and publishes what it means.
    ///
    /// Undecodable frames are logged at `warn` and dropped without notifying
    /// anyone.  Returns the published event, if any.
    pub fn handle_frame(&self, raw: &str) -> Option<AppEvent> {
        match decode(raw) {
            Ok(envelope) => self.dispatch(&envelope),
            Err(e) => {
                warn!("dropping inbound frame: {e}");
                None
            }
        }
    }

    /// Classifies `envelope` and publishes the resulting event, if any.
    pub fn dispatch(&self, envelope: &Envelope) -> Option<AppEvent> {
        let event = Self::classify(envelope)?;
        self.publish(&event);
        Some(event)
    }

    /// Maps an envelope to the event the UI should see.
    ///
    /// Returns `None` for heartbeat traffic and unknown message types.
    pub fn classify(envelope: &Envelope) -> Option<AppEvent> {
        let content = || envelope.content.as_deref().unwrap_or_default();
        match envelope.message_type() {
            MessageType::UserInput => {
                Some(AppEvent::MessageReceived(ChatMessage::user(content())))
            }
            MessageType::AiResponse => Some(AppEvent::MessageReceived(ChatMessage::ai(content()))),
            MessageType::AssessmentResult => {
                let scores = envelope.scores.unwrap_or_default();
                let feedback = envelope.feedback.clone().unwrap_or_default();
                Some(AppEvent::AssessmentReceived(AssessmentReport::new(
                    scores, feedback,
                )))
            }
            MessageType::Error => {
                let message = envelope.message.as_deref().unwrap_or_default();
                warn!("server reported an error: {message}");
                Some(AppEvent::MessageReceived(ChatMessage::system(message)))
            }
            MessageType::Pong | MessageType::Ping => {
                trace!(
                    "heartbeat '{}' received (server time {:?})",
                    envelope.kind,
                    envelope.timestamp
                );
                None
            }
            MessageType::Unknown => {
                debug!("ignoring envelope of unknown type '{}'", envelope.kind);
                None
            }
        }
    }

    // ── Fan-out ───────────────────────────────────────────────────────────────

    /// Delivers `event` to every subscriber of its kind.
    pub fn publish(&self, event: &AppEvent) {
        match event {
            AppEvent::MessageReceived(message) => {
                for callback in snapshot(&self.message_subscribers) {
                    callback(message);
                }
            }
            AppEvent::AssessmentReceived(report) => {
                for callback in snapshot(&self.assessment_subscribers) {
                    callback(report);
                }
            }
        }
    }

    /// Delivers a connection notification to every lifecycle subscriber.
    pub fn publish_lifecycle(&self, event: &LifecycleEvent) {
        for callback in snapshot(&self.lifecycle_subscribers) {
            callback(event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("message_subscribers", &snapshot(&self.message_subscribers).len())
            .field(
                "assessment_subscribers",
                &snapshot(&self.assessment_subscribers).len(),
            )
            .field(
                "lifecycle_subscribers",
                &snapshot(&self.lifecycle_subscribers).len(),
            )
            .finish()
    }
}

// A panicking subscriber must not silence every later event, so poisoned
// locks are entered anyway.
fn snapshot<T: ?Sized>(list: &RwLock<Vec<Arc<T>>>) -> Vec<Arc<T>> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write_list<T: ?Sized>(
    list: &RwLock<Vec<Arc<T>>>,
) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<T>>> {
    list.write().unwrap_or_else(PoisonError::into_inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
