//! Hook event types.
//!
//! Defines the lifecycle points at which hooks can be triggered.

use serde::Deserialize;
use serde::Serialize;

/// Lifecycle point at which hooks fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    /// Before a turn's generation begins. May short-circuit or rewrite input.
    PreGenerate,
    /// After a turn completes successfully.
    PostGenerate,
    /// After a generation attempt fails. May request a retry.
    PostGenerateFailure,
    /// Before a tool executes. May block the call.
    PreToolUse,
    /// After a tool completes successfully.
    PostToolUse,
    /// After a tool fails.
    PostToolUseFailure,
    /// Before context compaction runs.
    PreCompact,
    /// After context compaction completes.
    PostCompact,
}

impl HookEvent {
    /// Returns the string representation of this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreGenerate => "pre_generate",
            Self::PostGenerate => "post_generate",
            Self::PostGenerateFailure => "post_generate_failure",
            Self::PreToolUse => "pre_tool_use",
            Self::PostToolUse => "post_tool_use",
            Self::PostToolUseFailure => "post_tool_use_failure",
            Self::PreCompact => "pre_compact",
            Self::PostCompact => "post_compact",
        }
    }
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "event.test.rs"]
mod tests;
