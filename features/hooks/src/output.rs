//! Hook result types.
//!
//! After a hook executes, it produces a [`HookOutput`] that determines how
//! the runtime proceeds.

use tandem_protocol::Message;
use tandem_protocol::TurnResult;

/// The outcome of a single hook execution.
#[derive(Debug, Clone)]
pub enum HookOutput {
    /// Continue normal execution (hook did not intervene).
    Continue,

    /// Reject the current action.
    Block {
        /// Human-readable reason for the rejection.
        reason: String,
    },

    /// Short-circuit the turn with a prepared result (`PreGenerate` only).
    ///
    /// Takes precedence over `UpdateInput` from later hooks.
    RespondWith { result: TurnResult },

    /// Replace the turn's input before generation (`PreGenerate` only).
    UpdateInput {
        /// Replacement prompt, if the turn was prompt-driven.
        prompt: Option<String>,
        /// Replacement messages, if the turn was message-driven.
        messages: Option<Vec<Message>>,
    },

    /// Request a retry of the failed generation (`PostGenerateFailure` only).
    Retry { retry_delay_ms: u64 },
}

impl HookOutput {
    /// Whether this output blocks the current action.
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// The block reason, if blocking.
    pub fn block_reason(&self) -> Option<&str> {
        match self {
            Self::Block { reason } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "output.test.rs"]
mod tests;
