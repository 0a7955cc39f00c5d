//! Tool execution context.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use serde_json::Value;
use tandem_protocol::ConversationState;
use tandem_protocol::InterruptKind;
use tokio_util::sync::CancellationToken;

use crate::failure::InterruptSignal;
use crate::failure::ToolFailure;

/// Out-of-band responses bound to resumed tool calls.
///
/// Keyed by the raw tool call id on both the produce side (resume) and the
/// consume side (the tool's `interrupt()` call). Each response is delivered
/// exactly once.
#[derive(Debug, Clone, Default)]
pub struct InterruptResponses {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl InterruptResponses {
    /// Create an empty response table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a response for a tool call id.
    pub fn bind(&self, tool_call_id: impl Into<String>, response: Value) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.insert(tool_call_id.into(), response);
    }

    /// Take the bound response for a tool call id, if any. One-shot.
    pub fn take(&self, tool_call_id: &str) -> Option<Value> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.remove(tool_call_id)
    }
}

/// Context passed to a tool during execution.
pub struct ToolContext {
    /// The id of the tool call being executed.
    pub tool_call_id: String,

    /// The tool's registered name.
    pub tool_name: String,

    /// The thread the turn runs against, if any.
    pub thread_id: Option<String>,

    /// The turn's cancellation signal.
    pub cancel: CancellationToken,

    /// Shared conversation state. Mutated only here (pipeline stages 1–4
    /// never touch it).
    pub state: Arc<Mutex<ConversationState>>,

    responses: InterruptResponses,
}

impl ToolContext {
    /// Create a context for one tool call.
    pub fn new(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        state: Arc<Mutex<ConversationState>>,
        responses: InterruptResponses,
    ) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            thread_id: None,
            cancel: CancellationToken::new(),
            state,
            responses,
        }
    }

    /// Set the thread id and return `self` for chaining.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Set the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Request out-of-band data from the caller.
    ///
    /// If a response was bound for this tool call (by a resume), it is
    /// returned once and removed. Otherwise an [`InterruptSignal`] is raised;
    /// the turn executor persists it and the turn returns interrupted. A
    /// second `interrupt()` call after consuming the bound response raises a
    /// fresh signal.
    pub fn interrupt(&self, request: Value) -> Result<Value, ToolFailure> {
        if let Some(response) = self.responses.take(&self.tool_call_id) {
            return Ok(response);
        }
        Err(ToolFailure::Interrupt(InterruptSignal {
            tool_call_id: self.tool_call_id.clone(),
            tool_name: self.tool_name.clone(),
            request,
            kind: InterruptKind::Custom,
        }))
    }

    /// Run a closure against the conversation state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut ConversationState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }
}

#[cfg(test)]
#[path = "context.test.rs"]
mod tests;
