//! JSON codec for assessment-protocol envelopes.
//!
//! Wire format: one UTF-8 JSON object per WebSocket text frame.  The object
//! must carry a string `"type"` field; every other field is optional.
//!
//! Decoding is two-step so failures can be told apart: the text is first
//! parsed as a generic JSON value (catching non-JSON and non-object input and
//! a missing `type`), then converted into an [`Envelope`] (catching known
//! fields that have the wrong JSON type).

use serde_json::Value;
use thiserror::Error;

use crate::protocol::envelope::Envelope;

/// Errors that can occur while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON.
    #[error("frame is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    /// The frame is valid JSON but not an object (e.g. an array or a number).
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The object has no `type` field, or `type` is not a string.
    #[error("frame has no string `type` field")]
    MissingType,

    /// A known field is present with the wrong JSON type.
    #[error("frame has an invalid field: {0}")]
    InvalidField(#[source] serde_json::Error),
}

/// Errors that can occur while encoding an outbound envelope.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// serde_json refused to serialize the envelope.
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one [`Envelope`] from a raw text frame.
///
/// Unknown fields are ignored and an unknown `type` is not an error; see
/// [`Envelope::message_type`].
///
/// # Errors
///
/// Returns [`DecodeError`] if the text is malformed or lacks a string `type`.
///
/// # Examples
///
/// ```rust
/// use assess_core::{decode, MessageType};
///
/// let env = decode(r#"{"type":"ai_response","content":"你好"}"#).unwrap();
/// assert_eq!(env.message_type(), MessageType::AiResponse);
/// assert_eq!(env.content.as_deref(), Some("你好"));
/// ```
pub fn decode(raw: &str) -> Result<Envelope, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(DecodeError::NotJson)?;

    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;
    if !matches!(object.get("type"), Some(Value::String(_))) {
        return Err(DecodeError::MissingType);
    }

    serde_json::from_value(value).map_err(DecodeError::InvalidField)
}

/// Encodes an [`Envelope`] into a compact JSON text frame.
///
/// Optional fields that are `None` are omitted.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use assess_core::{encode, Envelope};
///
/// assert_eq!(encode(&Envelope::ping()).unwrap(), r#"{"type":"ping"}"#);
/// ```
pub fn encode(envelope: &Envelope) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(envelope)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
