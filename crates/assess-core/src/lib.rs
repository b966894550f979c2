//! # assess-core
//!
//! Shared library for the speech-assessment chat client containing the JSON
//! wire codec and the display types handed to the chat UI.
//!
//! This crate has zero dependencies on sockets, timers, or async runtimes.
//!
//! # Architecture overview
//!
//! The client talks to an assessment server over a WebSocket.  Every text
//! frame carries one JSON object (an *envelope*) whose `"type"` field says
//! what the rest of the object means.  The server echoes what the user said,
//! streams the AI tutor's answer, and finally scores the user's pronunciation.
//!
//! - **`protocol`** – The envelope, its message types, the score set, and the
//!   stateless encode/decode functions.
//!
//! - **`domain`** – What the chat UI actually displays: a [`ChatMessage`]
//!   tagged with a [`MessageKind`] for styling, and an [`AssessmentReport`]
//!   whose text block follows a fixed field order.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `assess_core::Envelope` instead of `assess_core::protocol::envelope::Envelope`.
pub use domain::display::{AssessmentReport, ChatMessage, MessageKind};
pub use protocol::codec::{decode, encode, DecodeError, EncodeError};
pub use protocol::envelope::{Envelope, MessageType, ScoreSet};
