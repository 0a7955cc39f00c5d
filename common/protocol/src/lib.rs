//! Protocol types for the tandem agent runtime.
//!
//! This crate holds the data model shared across the workspace:
//! - Conversation messages and content parts
//! - Stream chunks and finish reasons
//! - Checkpoints, interrupts, and conversation state
//! - Background task records
//! - Token budgets and usage
//! - Turn results and permission modes
//! - Context/compaction configuration

mod budget;
mod checkpoint;
mod compact;
mod message;
mod permission;
mod state;
mod stream;
mod task;
mod turn;

pub use budget::TokenBudget;
pub use checkpoint::{Checkpoint, Interrupt, InterruptKind, interrupt_id};
pub use compact::{
    CompactDecision, CompactReason, CompactionPolicy, CompactionResult, ContextConfig,
    SchedulerConfig, SummarizationConfig, SummarizationStrategy,
};
pub use message::{ContentPart, Message, MessageContent, Role, ToolResultOutput, validate_conversation};
pub use permission::{PermissionBehavior, PermissionMode};
pub use state::{ConversationState, FileRecord, TodoItem, TodoStatus};
pub use stream::{FinishReason, StreamChunk, TokenUsage};
pub use task::{BackgroundTask, TaskFilter, TaskStatus};
pub use turn::TurnResult;
