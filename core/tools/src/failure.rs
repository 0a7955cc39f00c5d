//! Tool failure types, including the interrupt signal.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tandem_error::AgentError;
use tandem_protocol::InterruptKind;

/// A request to pause the turn, raised from inside a tool execution.
///
/// This is control flow, not an error: the turn executor catches it,
/// persists a pending interrupt, and returns an interrupted result. It is
/// never routed through `wrap_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptSignal {
    pub tool_call_id: String,
    pub tool_name: String,
    pub request: Value,
    pub kind: InterruptKind,
}

/// Why a tool execution did not produce an output.
#[derive(Debug)]
pub enum ToolFailure {
    /// The tool paused for out-of-band data.
    Interrupt(InterruptSignal),
    /// The tool failed.
    Error(AgentError),
}

impl ToolFailure {
    /// The interrupt signal, if this failure is one.
    pub fn as_interrupt(&self) -> Option<&InterruptSignal> {
        match self {
            Self::Interrupt(signal) => Some(signal),
            Self::Error(_) => None,
        }
    }
}

impl From<AgentError> for ToolFailure {
    fn from(err: AgentError) -> Self {
        Self::Error(err)
    }
}

impl std::fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupt(signal) => {
                write!(f, "interrupted: {} ({})", signal.tool_name, signal.tool_call_id)
            }
            Self::Error(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(test)]
#[path = "failure.test.rs"]
mod tests;
