use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn of the interview.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Ai,
    User,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Ai => write!(f, "ai"),
            Speaker::User => write!(f, "user"),
        }
    }
}

/// One recorded utterance.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn ai(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Ai,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }
}

/// Append-only record of a session's turns.
///
/// Only the session controller can clear it, which it does when a new
/// session starts. Readers get a slice.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct TranscriptLog {
    turns: Vec<Turn>,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns spoken by `speaker`.
    pub fn count(&self, speaker: Speaker) -> usize {
        self.turns.iter().filter(|t| t.speaker == speaker).count()
    }
}
