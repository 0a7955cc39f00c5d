//! Durable conversation snapshots and pending interrupts.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::message::Message;
use crate::state::ConversationState;

/// The interrupt id for a given tool call id.
pub fn interrupt_id(tool_call_id: &str) -> String {
    format!("int_{tool_call_id}")
}

/// The kind of a pending interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterruptKind {
    /// Raised by the permission pipeline when a tool requires approval.
    Approval,
    /// Raised by a tool requesting out-of-band data.
    Custom,
}

/// A paused turn awaiting an out-of-band response.
///
/// Exactly one interrupt may be pending per thread; its id is always
/// `"int_" + tool_call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    pub id: String,
    pub thread_id: String,
    pub kind: InterruptKind,
    pub tool_call_id: String,
    pub tool_name: String,
    pub request: Value,
    pub created_at: DateTime<Utc>,
}

impl Interrupt {
    /// Create an interrupt for a tool call, deriving the canonical id.
    pub fn new(
        thread_id: impl Into<String>,
        kind: InterruptKind,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        request: Value,
    ) -> Self {
        let tool_call_id = tool_call_id.into();
        Self {
            id: interrupt_id(&tool_call_id),
            thread_id: thread_id.into(),
            kind,
            tool_call_id,
            tool_name: tool_name.into(),
            request,
            created_at: Utc::now(),
        }
    }
}

/// A durable, thread-keyed snapshot of a conversation.
///
/// A checkpoint with a `pending_interrupt` is the resumable state; one
/// without is the settled state after a completed turn. `(thread_id, step)`
/// is monotonically increasing per thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub step: u64,
    pub messages: Vec<Message>,
    pub state: ConversationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_interrupt: Option<Interrupt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Create a step-zero checkpoint for a new thread.
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            step: 0,
            messages: Vec::new(),
            state: ConversationState::new(),
            pending_interrupt: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy messages and state into a new thread (fork).
    ///
    /// The fork starts at step zero under the new id; any pending interrupt
    /// stays with the source thread.
    pub fn fork_to(&self, new_thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: new_thread_id.into(),
            step: 0,
            messages: self.messages.clone(),
            state: self.state.clone(),
            pending_interrupt: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "checkpoint.test.rs"]
mod tests;
