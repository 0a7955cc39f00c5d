//! Task store adapter over any [`KeyValueStore`].

use std::sync::Arc;

use async_trait::async_trait;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_protocol::BackgroundTask;
use tandem_protocol::TaskFilter;

use crate::kv::KeyValueStore;
use crate::task_store::TaskStore;
use crate::task_store::TaskStoreConfig;

/// Task store layered on a key-value backend.
pub struct KvTaskStore {
    kv: Arc<dyn KeyValueStore>,
    config: TaskStoreConfig,
}

impl KvTaskStore {
    /// Create an adapter over a backend with default config.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(kv, TaskStoreConfig::default())
    }

    /// Create an adapter with explicit config.
    pub fn with_config(kv: Arc<dyn KeyValueStore>, config: TaskStoreConfig) -> Self {
        Self { kv, config }
    }

    fn decode(&self, raw: &str) -> Result<BackgroundTask> {
        serde_json::from_str(raw).map_err(|e| {
            AgentError::new(ErrorCode::Backend, "task record is not valid JSON").with_source(e)
        })
    }
}

#[async_trait]
impl TaskStore for KvTaskStore {
    async fn save(&self, task: BackgroundTask) -> Result<()> {
        let key = self.config.key_for(&task.id);
        let json = serde_json::to_string(&task)
            .map_err(|e| AgentError::new(ErrorCode::Backend, "task record failed to serialise").with_source(e))?;
        self.kv.set(&key, json).await
    }

    async fn load(&self, task_id: &str) -> Result<Option<BackgroundTask>> {
        let key = self.config.key_for(task_id);
        match self.kv.get(&key).await? {
            Some(raw) => Ok(Some(self.decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, task_id: &str) -> Result<bool> {
        let key = self.config.key_for(task_id);
        self.kv.remove(&key).await
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<BackgroundTask>> {
        let prefix = self.config.key_for("");
        let mut tasks = Vec::new();
        for key in self.kv.keys_with_prefix(&prefix).await? {
            if let Some(raw) = self.kv.get(&key).await? {
                let task = self.decode(&raw)?;
                if filter.matches(&task) {
                    tasks.push(task);
                }
            }
        }
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }

    async fn cleanup(&self) -> Result<usize> {
        let mut removed = 0;
        for task in self.list(&TaskFilter::default()).await? {
            if self.config.is_expired(&task) && self.delete(&task.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "task_kv.test.rs"]
mod tests;
