//! File-backed checkpoint store, one JSON file per thread.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tandem_error::Result;
use tandem_protocol::Checkpoint;
use tokio::sync::Mutex;
use tracing::debug;

use crate::checkpointer::Checkpointer;
use crate::checkpointer::checkpoint_error;

/// Checkpoint store writing one JSON file per thread under a directory.
///
/// Saves write to a temporary file and rename into place, so readers observe
/// either the previous checkpoint or the new one.
pub struct FileCheckpointer {
    dir: PathBuf,
    locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileCheckpointer {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: std::sync::Mutex::new(HashMap::new()),
        }
    }

    fn thread_lock(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn path_for(&self, thread_id: &str) -> PathBuf {
        // Thread ids are caller-chosen; keep them filesystem-safe.
        let safe: String = thread_id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    async fn read_existing(&self, path: &Path, thread_id: &str) -> Result<Option<Checkpoint>> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let checkpoint = serde_json::from_str(&content)
                    .map_err(|e| checkpoint_error("load", thread_id, e))?;
                Ok(Some(checkpoint))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(checkpoint_error("load", thread_id, e)),
        }
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn save(&self, mut checkpoint: Checkpoint) -> Result<Checkpoint> {
        let lock = self.thread_lock(&checkpoint.thread_id);
        let _guard = lock.lock().await;

        let thread_id = checkpoint.thread_id.clone();
        let path = self.path_for(&thread_id);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| checkpoint_error("save", &thread_id, e))?;

        let existing = self.read_existing(&path, &thread_id).await.ok().flatten();
        checkpoint.step = existing.as_ref().map_or(1, |c| c.step + 1);
        checkpoint.updated_at = Utc::now();
        if let Some(existing) = &existing {
            checkpoint.created_at = existing.created_at;
        }

        let json = serde_json::to_string_pretty(&checkpoint)
            .map_err(|e| checkpoint_error("save", &thread_id, e))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| checkpoint_error("save", &thread_id, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| checkpoint_error("save", &thread_id, e))?;

        debug!(
            thread_id = %thread_id,
            step = checkpoint.step,
            path = %path.display(),
            "Saved checkpoint file"
        );

        Ok(checkpoint)
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock().await;
        self.read_existing(&self.path_for(thread_id), thread_id).await
    }

    async fn delete(&self, thread_id: &str) -> Result<bool> {
        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(self.path_for(thread_id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(checkpoint_error("delete", thread_id, e)),
        }
    }
}

#[cfg(test)]
#[path = "checkpoint_file.test.rs"]
mod tests;
