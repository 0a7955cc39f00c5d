//! Streaming chunk types and token usage.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::message::ToolResultOutput;

/// Token usage reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: i64,
    #[serde(default)]
    pub output_tokens: i64,
}

impl TokenUsage {
    /// Create a usage record.
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens consumed.
    pub fn total(&self) -> i64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate another usage record into this one.
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    #[default]
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Returns the string representation of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::ToolCalls => "tool-calls",
            Self::Length => "length",
            Self::ContentFilter => "content-filter",
            Self::Error => "error",
        }
    }
}

/// A chunk of streamed agent output.
///
/// Forwarded in arrival order; a `tool-result` for a call is never emitted
/// before the `tool-call` chunk for the same id. `reasoning-delta` accepts the
/// legacy `delta` field name and normalises it to `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamChunk {
    TextDelta {
        text: String,
    },

    ToolCall {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },

    ToolResult {
        tool_call_id: String,
        tool_name: String,
        output: ToolResultOutput,
    },

    ReasoningStart {
        id: String,
    },

    ReasoningDelta {
        id: String,
        #[serde(alias = "delta")]
        text: String,
    },

    ReasoningEnd {
        id: String,
    },

    Finish {
        finish_reason: FinishReason,
        total_usage: TokenUsage,
    },
}

#[cfg(test)]
#[path = "stream.test.rs"]
mod tests;
