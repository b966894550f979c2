//! Envelope types for the JSON-over-WebSocket assessment protocol.
//!
//! Every WebSocket text frame exchanged with the assessment server carries
//! exactly one JSON object.  The `"type"` field identifies what the object
//! means; the remaining fields are optional and only meaningful for some types.
//!
//! # Message flow
//!
//! ```text
//! Client → Server:  {"type":"ping"}
//! Server → Client:  {"type":"pong","timestamp":"2024-05-01 10:00:00"}
//!                   {"type":"user_input","content":"<recognised speech>"}
//!                   {"type":"ai_response","content":"<tutor reply>"}
//!                   {"type":"assessment_result","scores":{...},"feedback":"..."}
//!                   {"type":"error","message":"<diagnostic>"}
//! ```
//!
//! # Why is `type` kept as a raw string?
//!
//! The server may introduce new message types before this client learns about
//! them.  Decoding must not fail on an unfamiliar `type`; the envelope is kept
//! intact and [`Envelope::message_type`] reports [`MessageType::Unknown`], which
//! the dispatcher simply ignores.

use serde::{Deserialize, Serialize};

// ── Message type ──────────────────────────────────────────────────────────────

/// The fixed set of envelope types understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client keep-alive probe.
    Ping,
    /// Server reply to a [`MessageType::Ping`].
    Pong,
    /// Echo of what the user said (speech recognition output).
    UserInput,
    /// Reply produced by the AI tutor.
    AiResponse,
    /// Pronunciation scores plus free-text feedback.
    AssessmentResult,
    /// Server-side diagnostic (e.g. the server could not parse our frame).
    Error,
    /// Any `type` string not listed above.
    Unknown,
}

impl MessageType {
    /// Classifies the `"type"` string found on the wire.
    ///
    /// Matching is exact and case-sensitive; anything unrecognised is
    /// [`MessageType::Unknown`].
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            "user_input" => Self::UserInput,
            "ai_response" => Self::AiResponse,
            "assessment_result" => Self::AssessmentResult,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Returns the string written into the `"type"` field for this variant.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::UserInput => "user_input",
            Self::AiResponse => "ai_response",
            Self::AssessmentResult => "assessment_result",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

// ── Score set ─────────────────────────────────────────────────────────────────

/// The five pronunciation scores attached to an `assessment_result`.
///
/// Every field defaults to `0.0` when absent so a partial payload still
/// produces a displayable result.  No range is enforced; values are shown
/// as received.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreSet {
    /// Overall score.
    #[serde(rename = "total_score")]
    pub total: f64,
    /// Fluency of the utterance.
    #[serde(rename = "fluency_score")]
    pub fluency: f64,
    /// Completeness: how much of the reference text was actually spoken.
    #[serde(rename = "integrity_score")]
    pub integrity: f64,
    /// Phonetic accuracy of initials and finals.
    #[serde(rename = "phone_score")]
    pub phone: f64,
    /// Tone accuracy.
    #[serde(rename = "tone_score")]
    pub tone: f64,
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// One JSON-encoded application message on the wire.
///
/// # Serde representation
///
/// Optional fields are omitted when serializing, so the heartbeat encodes as
/// the minimal `{"type":"ping"}`.  Unknown fields are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw `"type"` discriminant.  See [`Envelope::message_type`].
    #[serde(rename = "type")]
    pub kind: String,

    /// Text body of `user_input` and `ai_response` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Scores of an `assessment_result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreSet>,

    /// Improvement advice of an `assessment_result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    /// Diagnostic text of an `error` message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Server-side send time (`"%Y-%m-%d %H:%M:%S"`), informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Envelope {
    /// Creates an envelope of the given type with every optional field empty.
    pub fn new(message_type: MessageType) -> Self {
        Self {
            kind: message_type.wire_name().to_string(),
            content: None,
            scores: None,
            feedback: None,
            message: None,
            timestamp: None,
        }
    }

    /// The heartbeat probe sent by the client while connected.
    pub fn ping() -> Self {
        Self::new(MessageType::Ping)
    }

    /// A `user_input` echo carrying `content`.
    pub fn user_input(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(MessageType::UserInput)
        }
    }

    /// An `ai_response` carrying `content`.
    pub fn ai_response(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::new(MessageType::AiResponse)
        }
    }

    /// An `assessment_result` carrying `scores` and `feedback`.
    pub fn assessment_result(scores: ScoreSet, feedback: impl Into<String>) -> Self {
        Self {
            scores: Some(scores),
            feedback: Some(feedback.into()),
            ..Self::new(MessageType::AssessmentResult)
        }
    }

    /// A server `error` carrying a diagnostic `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(MessageType::Error)
        }
    }

    /// Classifies the raw `"type"` field.
    pub fn message_type(&self) -> MessageType {
        MessageType::from_wire(&self.kind)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
