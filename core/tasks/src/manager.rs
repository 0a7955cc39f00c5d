//! The task manager.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_protocol::BackgroundTask;
use tandem_protocol::TaskFilter;
use tandem_protocol::TaskStatus;
use tandem_store::MemoryTaskStore;
use tandem_store::TaskStore;
use tokio::sync::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Broadcast event for task state changes the session cares about.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Completed { task: BackgroundTask },
    Failed { task: BackgroundTask },
}

impl TaskEvent {
    /// The id of the task this event is about.
    pub fn task_id(&self) -> &str {
        match self {
            Self::Completed { task } | Self::Failed { task } => &task.id,
        }
    }
}

/// Tracks background subagent tasks.
///
/// The in-memory table is the registration source of truth for event
/// deduplication: a task consumed via the `task_output` tool is removed from
/// the table, so a later completion event for it is silently dropped by the
/// session. The store keeps the durable record either way.
pub struct TaskManager {
    tasks: Mutex<HashMap<String, BackgroundTask>>,
    store: Arc<dyn TaskStore>,
    events: broadcast::Sender<TaskEvent>,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new(Arc::new(MemoryTaskStore::new()))
    }
}

impl TaskManager {
    /// Create a manager persisting through the given store.
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            tasks: Mutex::new(HashMap::new()),
            store,
            events,
        }
    }

    /// Subscribe to completion/failure events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Create and register a pending task.
    pub async fn create(
        &self,
        subagent_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<BackgroundTask> {
        let task = BackgroundTask::new(subagent_type, description);
        self.store.save(task.clone()).await?;
        self.tasks
            .lock()
            .await
            .insert(task.id.clone(), task.clone());
        debug!(task_id = %task.id, subagent_type = %task.subagent_type, "Registered task");
        Ok(task)
    }

    /// A registered task by id.
    pub async fn get(&self, task_id: &str) -> Option<BackgroundTask> {
        self.tasks.lock().await.get(task_id).cloned()
    }

    /// Whether the task is still registered (not yet consumed).
    pub async fn is_registered(&self, task_id: &str) -> bool {
        self.tasks.lock().await.contains_key(task_id)
    }

    /// Registered tasks matching a filter.
    pub async fn list(&self, filter: &TaskFilter) -> Vec<BackgroundTask> {
        let mut tasks: Vec<BackgroundTask> = self
            .tasks
            .lock()
            .await
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        tasks
    }

    /// Remove a task from the live table (consume it).
    ///
    /// The durable store record is untouched; only event delivery stops.
    pub async fn remove(&self, task_id: &str) -> Option<BackgroundTask> {
        let removed = self.tasks.lock().await.remove(task_id);
        if removed.is_some() {
            debug!(task_id, "Task consumed and deregistered");
        }
        removed
    }

    async fn transition(
        &self,
        task_id: &str,
        next: TaskStatus,
        apply: impl FnOnce(&mut BackgroundTask),
    ) -> Result<BackgroundTask> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks.get_mut(task_id).ok_or_else(|| {
            AgentError::new(ErrorCode::Subagent, format!("unknown task: {task_id}"))
        })?;

        if !task.transition(next) {
            return Err(AgentError::new(
                ErrorCode::Subagent,
                format!("task {task_id} cannot move from {} to {next}", task.status),
            ));
        }
        apply(task);
        let snapshot = task.clone();
        drop(tasks);

        self.store.save(snapshot.clone()).await?;
        Ok(snapshot)
    }

    /// Mark a task running.
    pub async fn mark_running(&self, task_id: &str) -> Result<BackgroundTask> {
        self.transition(task_id, TaskStatus::Running, |_| {}).await
    }

    /// Complete a task with its result and emit `task_completed`.
    pub async fn complete(&self, task_id: &str, result: impl Into<String>) -> Result<BackgroundTask> {
        let result = result.into();
        let task = self
            .transition(task_id, TaskStatus::Completed, |task| {
                task.result = Some(result);
            })
            .await?;
        info!(task_id, "Task completed");
        let _ = self.events.send(TaskEvent::Completed { task: task.clone() });
        Ok(task)
    }

    /// Fail a task with its error and emit `task_failed`.
    pub async fn fail(&self, task_id: &str, error: impl Into<String>) -> Result<BackgroundTask> {
        let error = error.into();
        let task = self
            .transition(task_id, TaskStatus::Failed, |task| {
                task.error = Some(error);
            })
            .await?;
        warn!(task_id, "Task failed");
        let _ = self.events.send(TaskEvent::Failed { task: task.clone() });
        Ok(task)
    }

    /// Cancel a pending or running task.
    pub async fn cancel(&self, task_id: &str) -> Result<BackgroundTask> {
        self.transition(task_id, TaskStatus::Cancelled, |_| {}).await
    }

    /// Run a future as a background task.
    ///
    /// Registers the task, marks it running, and records the outcome when the
    /// future resolves. Returns the pending task record immediately.
    pub async fn spawn<F>(
        self: &Arc<Self>,
        subagent_type: impl Into<String>,
        description: impl Into<String>,
        work: F,
    ) -> Result<BackgroundTask>
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        let task = self.create(subagent_type, description).await?;
        let manager = self.clone();
        let task_id = task.id.clone();

        tokio::spawn(async move {
            if manager.mark_running(&task_id).await.is_err() {
                return;
            }
            match work.await {
                Ok(result) => {
                    if let Err(e) = manager.complete(&task_id, result).await {
                        warn!(task_id = %task_id, error = %e, "Failed to record task completion");
                    }
                }
                Err(e) => {
                    if let Err(record_err) = manager.fail(&task_id, e.to_string()).await {
                        warn!(
                            task_id = %task_id,
                            error = %record_err,
                            "Failed to record task failure"
                        );
                    }
                }
            }
        });

        Ok(task)
    }
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
