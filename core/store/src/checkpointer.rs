//! The checkpoint store contract.

use async_trait::async_trait;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_protocol::Checkpoint;

/// Build a `CHECKPOINT_ERROR` tagged with the failed operation.
///
/// `save` errors are retryable; `load` errors are not, since a failed load
/// may indicate a corrupt or missing record and must bubble to the caller.
pub fn checkpoint_error(
    operation: &str,
    thread_id: &str,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> AgentError {
    AgentError::new(
        ErrorCode::Checkpoint,
        format!("checkpoint {operation} failed for thread {thread_id}"),
    )
    .with_metadata("operation", operation)
    .with_thread_id(thread_id)
    .with_retryable(operation == "save")
    .with_source(cause)
}

/// Durable, thread-keyed snapshot storage.
///
/// Implementations serialise operations per thread: the step sequence emitted
/// by consecutive saves on one thread is strictly increasing, with no global
/// lock across threads.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist a checkpoint, assigning the next step for its thread.
    ///
    /// The write is atomic with respect to readers; `load` observes either
    /// the previous checkpoint or the new one, never a partial record.
    /// Returns the checkpoint as saved (step and timestamps assigned).
    async fn save(&self, checkpoint: Checkpoint) -> Result<Checkpoint>;

    /// The latest checkpoint for a thread. Absence is not an error.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove a thread's checkpoint. Returns whether one existed.
    async fn delete(&self, thread_id: &str) -> Result<bool>;
}
