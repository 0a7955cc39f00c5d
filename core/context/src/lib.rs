//! Context-window management: budgets, compaction, and scheduling.
//!
//! The [`ContextManager`] decides when the conversation needs compaction,
//! rolls the middle of the message list up into a summary, and optionally
//! runs compaction in the background so turns are never blocked on
//! summarisation.

mod manager;
mod scheduler;
mod summarizer;

pub use manager::{ContextManager, OnCompact, messages_fingerprint};
pub use scheduler::{CompactionScheduler, ScheduledTaskStatus};
pub use summarizer::{Summarizer, build_summary_prompt};
