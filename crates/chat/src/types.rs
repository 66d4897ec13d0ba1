//! Conversation types.

use chrono::{DateTime, Utc};
use noctua_search::RetrievedPassage;
use serde::{Deserialize, Serialize};

use crate::citations::Citation;

/// Who produced a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in the session transcript.
///
/// The transcript is ordered and append-only for the lifetime of a
/// session; it is cleared only on explicit user action and never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Result of one successful question/answer cycle.
#[derive(Debug, Clone)]
pub struct AskOutcome {
    /// Answer text, verbatim from the generation service
    pub answer: String,

    /// Passages that were passed to composition (post-threshold)
    pub passages: Vec<RetrievedPassage>,

    /// Citation markers found in the answer, flagged as resolved or not
    pub citations: Vec<Citation>,
}
