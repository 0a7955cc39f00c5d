//! Token counting for context management.
//!
//! Counts are estimates unless a model-reported usage record is available;
//! the default estimator uses a characters-per-token ratio with a fixed
//! per-message overhead. Custom counters plug in behind [`TokenCounter`] and
//! must be pure and deterministic.

mod counter;

pub use counter::{CachingCounter, EstimatingCounter, TokenCounter, message_content_hash};
