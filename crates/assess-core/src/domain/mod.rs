//! Domain layer for assess-core.
//!
//! Pure display types handed from the client to the chat UI.  Nothing here
//! performs I/O or knows about the WebSocket transport.

pub mod display;

pub use display::{AssessmentReport, ChatMessage, MessageKind};
