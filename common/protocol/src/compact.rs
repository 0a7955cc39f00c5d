//! Context-management configuration and compaction results.

use serde::Deserialize;
use serde::Serialize;

use crate::message::Message;

/// When compaction triggers relative to the token budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionPolicy {
    /// Whether compaction runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Usage fraction at which compaction is requested.
    #[serde(default = "default_token_threshold")]
    pub token_threshold: f64,

    /// Usage fraction at which compaction is mandatory.
    #[serde(default = "default_hard_cap_threshold")]
    pub hard_cap_threshold: f64,
}

fn default_enabled() -> bool {
    true
}

fn default_token_threshold() -> f64 {
    0.8
}

fn default_hard_cap_threshold() -> f64 {
    0.95
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            token_threshold: default_token_threshold(),
            hard_cap_threshold: default_hard_cap_threshold(),
        }
    }
}

/// How the middle of the conversation is summarised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizationStrategy {
    /// Replace the middle slice with a single summary message.
    #[default]
    Rollup,
}

/// Summarisation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizationConfig {
    /// Trailing non-system messages always preserved.
    #[serde(default = "default_keep_message_count")]
    pub keep_message_count: usize,

    /// Recent tool results preserved verbatim inside the kept tail.
    #[serde(default = "default_keep_tool_result_count")]
    pub keep_tool_result_count: usize,

    #[serde(default)]
    pub strategy: SummarizationStrategy,
}

fn default_keep_message_count() -> usize {
    5
}

fn default_keep_tool_result_count() -> usize {
    3
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            keep_message_count: default_keep_message_count(),
            keep_tool_result_count: default_keep_tool_result_count(),
            strategy: SummarizationStrategy::default(),
        }
    }
}

/// Background compaction scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enable_background_compaction: bool,

    /// Delay between scheduling and execution, so rapid turns coalesce.
    #[serde(default = "default_debounce_delay_ms")]
    pub debounce_delay_ms: u64,

    /// Pending-queue bound; older tasks are dropped on overflow.
    #[serde(default = "default_max_pending_tasks")]
    pub max_pending_tasks: usize,
}

fn default_debounce_delay_ms() -> u64 {
    500
}

fn default_max_pending_tasks() -> usize {
    4
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enable_background_compaction: false,
            debounce_delay_ms: default_debounce_delay_ms(),
            max_pending_tasks: default_max_pending_tasks(),
        }
    }
}

/// Full context-manager configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Context window size in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,

    #[serde(default)]
    pub policy: CompactionPolicy,

    #[serde(default)]
    pub summarization: SummarizationConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<SchedulerConfig>,
}

fn default_max_tokens() -> i64 {
    200_000
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            policy: CompactionPolicy::default(),
            summarization: SummarizationConfig::default(),
            scheduler: None,
        }
    }
}

/// Why a compaction was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompactReason {
    HardCap,
    TokenThreshold,
}

/// Outcome of a compaction decision check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompactDecision {
    pub trigger: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<CompactReason>,
}

impl CompactDecision {
    /// A no-compaction decision.
    pub fn skip() -> Self {
        Self {
            trigger: false,
            reason: None,
        }
    }

    /// A compaction decision with its reason.
    pub fn trigger(reason: CompactReason) -> Self {
        Self {
            trigger: true,
            reason: Some(reason),
        }
    }
}

/// The result of one compaction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactionResult {
    /// The generated summary text.
    pub summary: String,
    /// The messages that were rolled up.
    pub compacted_messages: Vec<Message>,
    /// The replacement message list.
    pub new_messages: Vec<Message>,
    pub messages_before: usize,
    pub messages_after: usize,
    pub tokens_before: i64,
    pub tokens_after: i64,
    pub tokens_saved: i64,
}

#[cfg(test)]
#[path = "compact.test.rs"]
mod tests;
