//! In-memory checkpoint store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tandem_error::Result;
use tandem_protocol::Checkpoint;
use tokio::sync::Mutex;
use tracing::debug;

use crate::checkpointer::Checkpointer;

/// Checkpoint store backed by a process-local map.
///
/// Suitable for tests and ephemeral agents; state dies with the process.
#[derive(Default)]
pub struct MemoryCheckpointer {
    inner: Mutex<HashMap<String, Checkpoint>>,
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryCheckpointer {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn save(&self, mut checkpoint: Checkpoint) -> Result<Checkpoint> {
        let lock = self.thread_lock(&checkpoint.thread_id);
        let _guard = lock.lock().await;

        let mut inner = self.inner.lock().await;
        let previous_step = inner
            .get(&checkpoint.thread_id)
            .map(|existing| existing.step);

        checkpoint.step = previous_step.map_or(1, |s| s + 1);
        checkpoint.updated_at = Utc::now();
        if let Some(existing) = inner.get(&checkpoint.thread_id) {
            checkpoint.created_at = existing.created_at;
        }

        debug!(
            thread_id = %checkpoint.thread_id,
            step = checkpoint.step,
            pending_interrupt = checkpoint.pending_interrupt.is_some(),
            "Saved checkpoint"
        );

        inner.insert(checkpoint.thread_id.clone(), checkpoint.clone());
        Ok(checkpoint)
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let inner = self.inner.lock().await;
        Ok(inner.get(thread_id).cloned())
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.remove(thread_id).is_some())
    }
}

#[cfg(test)]
#[path = "checkpoint_memory.test.rs"]
mod tests;
