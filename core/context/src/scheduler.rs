//! Background compaction scheduler.
//!
//! Tasks are queued FIFO, debounced, and executed one at a time by a worker
//! task. The queue is bounded: on overflow the oldest pending task is
//! dropped. Only pending tasks can be cancelled; `shutdown` fails everything
//! still queued and rejects future schedules.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tandem_error::AgentError;
use tandem_error::Result;
use tandem_protocol::CompactionResult;
use tandem_protocol::SchedulerConfig;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

/// Status of a scheduled compaction task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTaskStatus {
    Pending,
    Running,
    Completed,
    Failed(String),
    Cancelled,
}

type CompactionJob = Box<
    dyn FnOnce() -> Pin<Box<dyn Future<Output = Result<Option<CompactionResult>>> + Send>>
        + Send,
>;

struct QueuedTask {
    id: u64,
    job: CompactionJob,
}

#[derive(Default)]
struct Inner {
    queue: VecDeque<QueuedTask>,
    statuses: HashMap<u64, ScheduledTaskStatus>,
    latest_result: Option<CompactionResult>,
    shut_down: bool,
    next_id: u64,
}

/// Runs compaction jobs in the background.
///
/// Must be created inside a tokio runtime: the worker task is spawned at
/// construction.
pub struct CompactionScheduler {
    config: SchedulerConfig,
    inner: Arc<Mutex<Inner>>,
    notify: Arc<Notify>,
    shutdown_token: CancellationToken,
}

impl CompactionScheduler {
    /// Create a scheduler and spawn its worker.
    pub fn new(config: SchedulerConfig) -> Self {
        let inner: Arc<Mutex<Inner>> = Arc::default();
        let notify = Arc::new(Notify::new());
        let shutdown_token = CancellationToken::new();

        let worker_inner = inner.clone();
        let worker_notify = notify.clone();
        let worker_token = shutdown_token.clone();
        let debounce = Duration::from_millis(config.debounce_delay_ms);
        tokio::spawn(async move {
            worker_loop(worker_inner, worker_notify, worker_token, debounce).await;
        });

        Self {
            config,
            inner,
            notify,
            shutdown_token,
        }
    }

    /// Enqueue a compaction job. Returns its task id.
    ///
    /// On queue overflow the oldest pending task is dropped (marked
    /// cancelled). Fails once the scheduler is shut down.
    pub fn schedule<F>(&self, job: F) -> Result<u64>
    where
        F: FnOnce() -> Pin<Box<dyn Future<Output = Result<Option<CompactionResult>>> + Send>>
            + Send
            + 'static,
    {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.shut_down {
            return Err(AgentError::validation("Scheduler shut down"));
        }

        while inner.queue.len() >= self.config.max_pending_tasks {
            if let Some(dropped) = inner.queue.pop_front() {
                warn!(task_id = dropped.id, "Dropping oldest pending compaction on overflow");
                inner
                    .statuses
                    .insert(dropped.id, ScheduledTaskStatus::Cancelled);
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.statuses.insert(id, ScheduledTaskStatus::Pending);
        inner.queue.push_back(QueuedTask {
            id,
            job: Box::new(job),
        });
        debug!(task_id = id, queued = inner.queue.len(), "Scheduled background compaction");
        drop(inner);

        self.notify.notify_one();
        Ok(id)
    }

    /// Cancel a pending task.
    ///
    /// Fails for running, completed, or unknown tasks.
    pub fn cancel(&self, task_id: u64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let position = inner.queue.iter().position(|t| t.id == task_id);
        match position {
            Some(index) => {
                let _ = inner.queue.remove(index);
                inner.statuses.insert(task_id, ScheduledTaskStatus::Cancelled);
                Ok(())
            }
            None => Err(AgentError::validation(format!(
                "task {task_id} is not pending; only pending tasks can be cancelled"
            ))),
        }
    }

    /// The status of a scheduled task.
    pub fn status(&self, task_id: u64) -> Option<ScheduledTaskStatus> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.statuses.get(&task_id).cloned()
    }

    /// Take the most recent completed compaction result, if any.
    pub fn take_latest_result(&self) -> Option<CompactionResult> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.latest_result.take()
    }

    /// Number of tasks waiting in the queue.
    pub fn pending_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.queue.len()
    }

    /// Shut the scheduler down.
    ///
    /// Pending tasks are marked failed with "Scheduler shut down"; future
    /// schedules are rejected.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.shut_down = true;
        while let Some(task) = inner.queue.pop_front() {
            inner.statuses.insert(
                task.id,
                ScheduledTaskStatus::Failed("Scheduler shut down".to_string()),
            );
        }
        drop(inner);
        self.shutdown_token.cancel();
    }
}

impl Drop for CompactionScheduler {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

async fn worker_loop(
    inner: Arc<Mutex<Inner>>,
    notify: Arc<Notify>,
    shutdown: CancellationToken,
    debounce: Duration,
) {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => return,
            () = notify.notified() => {}
        }

        loop {
            // Debounce while the task stays pending; a cancel during the
            // debounce window removes it from the queue.
            let front_id = {
                let inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                match inner.queue.front() {
                    Some(task) => task.id,
                    None => break,
                }
            };

            tokio::select! {
                () = shutdown.cancelled() => return,
                () = tokio::time::sleep(debounce) => {}
            }

            let task = {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                match inner.queue.front() {
                    Some(task) if task.id == front_id => {
                        let task = inner.queue.pop_front();
                        if let Some(task) = &task {
                            inner.statuses.insert(task.id, ScheduledTaskStatus::Running);
                        }
                        task
                    }
                    // Cancelled (or replaced) during the debounce window.
                    _ => continue,
                }
            };

            let Some(task) = task else { break };
            let outcome = (task.job)().await;

            let mut guard = inner.lock().unwrap_or_else(|e| e.into_inner());
            match outcome {
                Ok(result) => {
                    guard.statuses.insert(task.id, ScheduledTaskStatus::Completed);
                    if let Some(result) = result {
                        debug!(task_id = task.id, "Background compaction completed");
                        guard.latest_result = Some(result);
                    }
                }
                Err(e) => {
                    warn!(task_id = task.id, error = %e, "Background compaction failed");
                    guard
                        .statuses
                        .insert(task.id, ScheduledTaskStatus::Failed(e.to_string()));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "scheduler.test.rs"]
mod tests;
