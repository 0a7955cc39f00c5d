//! The background task store contract.

use async_trait::async_trait;
use chrono::Duration;
use chrono::Utc;
use tandem_error::Result;
use tandem_protocol::BackgroundTask;
use tandem_protocol::TaskFilter;

/// Shared configuration for task store implementations.
#[derive(Debug, Clone, Default)]
pub struct TaskStoreConfig {
    /// Time-to-live for terminal tasks. `None` means records never expire.
    pub ttl: Option<std::time::Duration>,

    /// Prefix applied to every key so independent agents can share a backing
    /// store.
    pub namespace: Option<String>,
}

impl TaskStoreConfig {
    /// Config with a TTL for terminal tasks.
    pub fn with_ttl(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Default::default()
        }
    }

    /// Config with a namespace prefix.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            ..Default::default()
        }
    }

    /// The storage key for a task id under this namespace.
    pub fn key_for(&self, task_id: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{task_id}"),
            None => task_id.to_string(),
        }
    }

    /// Whether a task is past its TTL and eligible for cleanup.
    ///
    /// Only terminal tasks expire; pending and running tasks never do.
    pub fn is_expired(&self, task: &BackgroundTask) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        if !task.status.is_terminal() {
            return false;
        }
        let reference = task.completed_at.unwrap_or(task.updated_at);
        let age = Utc::now() - reference;
        age > Duration::from_std(ttl).unwrap_or(Duration::MAX)
    }
}

/// Durable record storage for background subagent tasks.
///
/// The full task record is persisted on every save so any store instance can
/// recover it.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a task record, replacing any previous version.
    async fn save(&self, task: BackgroundTask) -> Result<()>;

    /// Fetch a task by id. Absence is not an error.
    async fn load(&self, task_id: &str) -> Result<Option<BackgroundTask>>;

    /// Remove a task. Returns whether it existed.
    async fn delete(&self, task_id: &str) -> Result<bool>;

    /// Tasks matching the filter.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<BackgroundTask>>;

    /// Delete terminal tasks older than the configured TTL.
    ///
    /// Returns the number of records removed. With no TTL configured this is
    /// a no-op.
    async fn cleanup(&self) -> Result<usize>;
}

#[cfg(test)]
#[path = "task_store.test.rs"]
mod tests;
