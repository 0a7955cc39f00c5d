//! The result of a single agent turn.

use serde::Deserialize;
use serde::Serialize;

use crate::checkpoint::Interrupt;
use crate::stream::FinishReason;
use crate::stream::TokenUsage;

/// Outcome of one `generate` invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TurnResult {
    /// The turn ran to completion.
    Complete {
        text: String,
        usage: TokenUsage,
        finish_reason: FinishReason,
        /// Number of model round-trips the turn performed.
        steps: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        forked_session_id: Option<String>,
    },

    /// The turn paused mid-tool-call awaiting an out-of-band response.
    Interrupted {
        interrupt: Interrupt,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        forked_session_id: Option<String>,
    },
}

impl TurnResult {
    /// The final text, if the turn completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Complete { text, .. } => Some(text),
            Self::Interrupted { .. } => None,
        }
    }

    /// The pending interrupt, if the turn was interrupted.
    pub fn interrupt(&self) -> Option<&Interrupt> {
        match self {
            Self::Interrupted { interrupt, .. } => Some(interrupt),
            Self::Complete { .. } => None,
        }
    }

    /// Whether the turn was interrupted.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }

    /// The forked session id, if the turn was requested with a fork.
    pub fn forked_session_id(&self) -> Option<&str> {
        match self {
            Self::Complete {
                forked_session_id, ..
            }
            | Self::Interrupted {
                forked_session_id, ..
            } => forked_session_id.as_deref(),
        }
    }
}

#[cfg(test)]
#[path = "turn.test.rs"]
mod tests;
