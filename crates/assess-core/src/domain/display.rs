//! Ready-to-display chat lines and assessment blocks.
//!
//! The chat UI renders each delivered item as one coloured text block.  It
//! needs two things: the text itself, and a category tag that picks the style
//! (colour, font size, bracketed label).  [`MessageKind`] is that tag.

use std::fmt;

use crate::protocol::envelope::ScoreSet;

/// Display prefix for text the user said.
pub const USER_PREFIX: &str = "用户: ";
/// Display prefix for text produced by the AI tutor.
pub const AI_PREFIX: &str = "AI: ";
/// Display prefix for diagnostics reported by the server.
pub const SYSTEM_PREFIX: &str = "系统: ";

/// Category tag used by the UI to style a delivered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Connection notices and server diagnostics.
    System,
    /// Echo of the user's own speech.
    User,
    /// AI tutor reply.
    Ai,
    /// Formatted assessment block.
    Assessment,
}

impl MessageKind {
    /// Bracketed label shown in front of a line, e.g. `"[AI]"`.
    pub fn label(self) -> &'static str {
        match self {
            Self::System => "[系统]",
            Self::User => "[用户]",
            Self::Ai => "[AI]",
            Self::Assessment => "[评测]",
        }
    }
}

/// One chat-style line: origin tag plus prefixed display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who the line originates from.  Never [`MessageKind::Assessment`].
    pub kind: MessageKind,
    /// Display text including the origin prefix.
    pub text: String,
}

impl ChatMessage {
    /// A line the user said; content is kept verbatim after the prefix.
    pub fn user(content: &str) -> Self {
        Self {
            kind: MessageKind::User,
            text: format!("{USER_PREFIX}{content}"),
        }
    }

    /// A line the AI tutor said.
    pub fn ai(content: &str) -> Self {
        Self {
            kind: MessageKind::Ai,
            text: format!("{AI_PREFIX}{content}"),
        }
    }

    /// A server diagnostic or connection notice.
    pub fn system(content: &str) -> Self {
        Self {
            kind: MessageKind::System,
            text: format!("{SYSTEM_PREFIX}{content}"),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A scored pronunciation assessment, pre-formatted for display.
///
/// The text block lists total, fluency, integrity, phonetic and tone scores
/// (two decimals each, in that order), a blank line, then the feedback.
/// Consumers rely on this order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentReport {
    /// Scores as received.
    pub scores: ScoreSet,
    /// Improvement advice as received.
    pub feedback: String,
    /// Multi-line display block.
    pub text: String,
}

impl AssessmentReport {
    /// Builds a report and renders its display block.
    pub fn new(scores: ScoreSet, feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();
        let text = format_assessment(&scores, &feedback);
        Self {
            scores,
            feedback,
            text,
        }
    }

    /// Always [`MessageKind::Assessment`].
    pub fn kind(&self) -> MessageKind {
        MessageKind::Assessment
    }
}

impl fmt::Display for AssessmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn format_assessment(scores: &ScoreSet, feedback: &str) -> String {
    format!(
        "总分: {:.2}\n流畅度: {:.2}\n完整度: {:.2}\n发音分: {:.2}\n声调分: {:.2}\n\n改进建议:\n{}",
        scores.total, scores.fluency, scores.integrity, scores.phone, scores.tone, feedback
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
