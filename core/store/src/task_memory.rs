//! In-memory task store.

use std::collections::HashMap;

use async_trait::async_trait;
use tandem_error::Result;
use tandem_protocol::BackgroundTask;
use tandem_protocol::TaskFilter;
use tokio::sync::RwLock;
use tracing::debug;

use crate::task_store::TaskStore;
use crate::task_store::TaskStoreConfig;

/// Task store backed by a process-local map.
#[derive(Default)]
pub struct MemoryTaskStore {
    config: TaskStoreConfig,
    inner: RwLock<HashMap<String, BackgroundTask>>,
}

impl MemoryTaskStore {
    /// Create an empty store with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with explicit config.
    pub fn with_config(config: TaskStoreConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn save(&self, task: BackgroundTask) -> Result<()> {
        let key = self.config.key_for(&task.id);
        self.inner.write().await.insert(key, task);
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<BackgroundTask>> {
        let key = self.config.key_for(task_id);
        Ok(self.inner.read().await.get(&key).cloned())
    }

    async fn delete(&self, task_id: &str) -> Result<bool> {
        let key = self.config.key_for(task_id);
        Ok(self.inner.write().await.remove(&key).is_some())
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<BackgroundTask>> {
        let prefix = self.config.key_for("");
        let inner = self.inner.read().await;
        let mut tasks: Vec<BackgroundTask> = inner
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, task)| task.clone())
            .filter(|task| filter.matches(task))
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn cleanup(&self) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|_, task| !self.config.is_expired(task));
        let removed = before - inner.len();
        if removed > 0 {
            debug!(removed, "Cleaned up expired tasks");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "task_memory.test.rs"]
mod tests;
