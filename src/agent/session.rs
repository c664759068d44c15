//! Conversation memory.
//!
//! A [`Session`] lives for the whole process and only grows: turns are
//! appended in order and never edited.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;

/// What the reasoning engine returned for one utterance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ResponsePayload {
    /// Plain text answer.
    Text(String),
    /// A JSON object or array the engine answered with.
    Structured {
        /// The answer exactly as the model wrote it.
        raw: String,
        /// Parsed form, for callers that inspect fields.
        value: Value,
    },
}

impl ResponsePayload {
    /// Classifies raw model output.
    ///
    /// Content that parses as a JSON object or array is kept structured;
    /// everything else, including bare JSON scalars, stays text.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        match serde_json::from_str::<Value>(content.trim()) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self::Structured {
                raw: content.to_string(),
                value,
            },
            _ => Self::Text(content.to_string()),
        }
    }

    /// Text shown to the user, handed to the publisher and replayed as
    /// memory.
    ///
    /// Both variants yield the model's own text unchanged, so key order and
    /// number precision in structured answers survive.
    #[must_use]
    pub fn to_publish_text(&self) -> String {
        match self {
            Self::Text(text) | Self::Structured { raw: text, .. } => text.clone(),
        }
    }

    /// Parsed JSON, for structured answers.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Text(_) => None,
            Self::Structured { value, .. } => Some(value),
        }
    }
}

/// One utterance and the engine's answer to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// What the user said.
    pub utterance: String,
    /// What the engine answered.
    pub response: ResponsePayload,
    /// When the answer was recorded.
    pub timestamp: DateTime<Local>,
}

impl Turn {
    /// Creates a turn stamped with the current local time.
    #[must_use]
    pub fn new(utterance: impl Into<String>, response: ResponsePayload) -> Self {
        Self {
            utterance: utterance.into(),
            response,
            timestamp: Local::now(),
        }
    }
}

/// Append-only record of one conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
}

impl Session {
    /// Starts an empty session with a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            turns: Vec::new(),
        }
    }

    /// Session identifier, stable for the life of the process.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All turns in the order they happened.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn.
    #[must_use]
    pub fn latest(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` before the first turn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
