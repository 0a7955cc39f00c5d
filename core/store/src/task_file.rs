//! File-backed task store, one JSON file per task.

use std::path::PathBuf;

use async_trait::async_trait;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_protocol::BackgroundTask;
use tandem_protocol::TaskFilter;
use tracing::debug;

use crate::task_store::TaskStore;
use crate::task_store::TaskStoreConfig;

fn store_error(
    operation: &str,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> AgentError {
    AgentError::new(ErrorCode::Backend, format!("task store {operation} failed"))
        .with_metadata("operation", operation)
        .with_source(cause)
}

/// Task store writing one JSON file per task under a directory.
///
/// Namespaced stores share the directory; the namespace becomes a filename
/// prefix.
pub struct FileTaskStore {
    dir: PathBuf,
    config: TaskStoreConfig,
}

impl FileTaskStore {
    /// Create a store rooted at `dir` with default config.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_config(dir, TaskStoreConfig::default())
    }

    /// Create a store with explicit config.
    pub fn with_config(dir: impl Into<PathBuf>, config: TaskStoreConfig) -> Self {
        Self {
            dir: dir.into(),
            config,
        }
    }

    fn path_for(&self, task_id: &str) -> PathBuf {
        let key = self.config.key_for(task_id);
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    async fn read_all(&self) -> Result<Vec<BackgroundTask>> {
        let mut tasks = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tasks),
            Err(e) => return Err(store_error("list", e)),
        };

        let prefix: String = self
            .config
            .key_for("")
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();

        while let Some(entry) = entries.next_entry().await.map_err(|e| store_error("list", e))? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".json") || !name.starts_with(&prefix) {
                continue;
            }
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| store_error("list", e))?;
            match serde_json::from_str::<BackgroundTask>(&content) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable task record");
                }
            }
        }

        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tasks)
    }
}

#[async_trait]
impl TaskStore for FileTaskStore {
    async fn save(&self, task: BackgroundTask) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| store_error("save", e))?;

        let path = self.path_for(&task.id);
        let json = serde_json::to_string_pretty(&task).map_err(|e| store_error("save", e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| store_error("save", e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| store_error("save", e))?;
        Ok(())
    }

    async fn load(&self, task_id: &str) -> Result<Option<BackgroundTask>> {
        match tokio::fs::read_to_string(self.path_for(task_id)).await {
            Ok(content) => {
                let task = serde_json::from_str(&content).map_err(|e| store_error("load", e))?;
                Ok(Some(task))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_error("load", e)),
        }
    }

    async fn delete(&self, task_id: &str) -> Result<bool> {
        match tokio::fs::remove_file(self.path_for(task_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(store_error("delete", e)),
        }
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<BackgroundTask>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect())
    }

    async fn cleanup(&self) -> Result<usize> {
        let mut removed = 0;
        for task in self.read_all().await? {
            if self.config.is_expired(&task) && self.delete(&task.id).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, dir = %self.dir.display(), "Cleaned up expired task files");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "task_file.test.rs"]
mod tests;
