//! Hook execution context.
//!
//! Provides all information available to a hook at execution time.

use std::collections::HashMap;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::event::HookEvent;

/// Context passed to hooks during execution.
#[derive(Debug, Clone)]
pub struct HookContext {
    /// The event that triggered the hook.
    pub event: HookEvent,

    /// The thread the current turn runs against, if any.
    pub thread_id: Option<String>,

    /// The tool call id (for tool-related events).
    pub tool_use_id: Option<String>,

    /// The tool name (for tool-related events).
    pub tool_name: Option<String>,

    /// The tool input (for tool-related events).
    pub tool_input: Option<Value>,

    /// Additional event payload: error details for failure events, the
    /// compaction result for compaction events.
    pub metadata: HashMap<String, Value>,

    /// The turn's cancellation signal.
    pub cancel: CancellationToken,
}

impl HookContext {
    /// Create a context for an event.
    pub fn new(event: HookEvent) -> Self {
        Self {
            event,
            thread_id: None,
            tool_use_id: None,
            tool_name: None,
            tool_input: None,
            metadata: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the thread id and return `self` for chaining.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Set the tool call being gated.
    pub fn with_tool(
        mut self,
        tool_use_id: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: Value,
    ) -> Self {
        self.tool_use_id = Some(tool_use_id.into());
        self.tool_name = Some(tool_name.into());
        self.tool_input = Some(tool_input);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[cfg(test)]
#[path = "context.test.rs"]
mod tests;
