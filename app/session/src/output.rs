//! Session output events.

use tandem_protocol::TurnResult;

/// One event pushed from the session loop to its consumer.
#[derive(Debug, Clone)]
pub enum SessionOutput {
    /// The session is idle and waiting for the next stimulus.
    WaitingForInput,

    /// Streamed model text.
    TextDelta { text: String },

    /// The model requested a tool invocation.
    ToolCall {
        tool_call_id: String,
        tool_name: String,
    },

    /// A tool invocation finished.
    ToolResult {
        tool_call_id: String,
        tool_name: String,
    },

    /// A turn finished.
    GenerationComplete { result: TurnResult },

    /// A turn failed.
    GenerationFailed { error: String },

    /// A registered background task completed (synthetic event).
    TaskCompleted { task_id: String },

    /// A registered background task failed (synthetic event).
    TaskFailed { task_id: String },
}

impl SessionOutput {
    /// Whether this is a terminal event for one turn.
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            Self::GenerationComplete { .. } | Self::GenerationFailed { .. }
        )
    }
}
