//! The session loop.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_stream::stream;
use async_trait::async_trait;
use futures::Stream;
use tandem_agent::Agent;
use tandem_agent::GenerateOptions;
use tandem_error::AgentError;
use tandem_error::Result;
use tandem_protocol::StreamChunk;
use tandem_protocol::TurnResult;
use tandem_tasks::TaskEvent;
use tandem_tasks::TaskManager;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::output::SessionOutput;

/// The interface view of an agent a session holds.
///
/// The session deliberately does not hold a full agent: it only needs to run
/// turns and observe the task manager, which keeps the
/// agent/task-manager/session reference graph acyclic.
#[async_trait]
pub trait SessionAgent: Send + Sync {
    /// Run one prompt-driven turn.
    async fn generate_turn(&self, prompt: String) -> Result<TurnResult>;

    /// Run one turn, pushing intermediate events to `events`.
    ///
    /// The default implementation produces no intermediate events.
    async fn stream_turn(
        &self,
        prompt: String,
        _events: mpsc::UnboundedSender<SessionOutput>,
    ) -> Result<TurnResult> {
        self.generate_turn(prompt).await
    }

    /// The agent's task manager.
    fn task_manager(&self) -> Arc<TaskManager>;
}

#[async_trait]
impl SessionAgent for Agent {
    async fn generate_turn(&self, prompt: String) -> Result<TurnResult> {
        self.generate(GenerateOptions::prompt(prompt)).await
    }

    async fn stream_turn(
        &self,
        prompt: String,
        events: mpsc::UnboundedSender<SessionOutput>,
    ) -> Result<TurnResult> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let turn = self.generate_streamed(GenerateOptions::prompt(prompt), tx);

        let forward = async {
            while let Some(chunk) = rx.recv().await {
                let event = match chunk {
                    Ok(StreamChunk::TextDelta { text }) => {
                        Some(SessionOutput::TextDelta { text })
                    }
                    Ok(StreamChunk::ToolCall {
                        tool_call_id,
                        tool_name,
                        ..
                    }) => Some(SessionOutput::ToolCall {
                        tool_call_id,
                        tool_name,
                    }),
                    Ok(StreamChunk::ToolResult {
                        tool_call_id,
                        tool_name,
                        ..
                    }) => Some(SessionOutput::ToolResult {
                        tool_call_id,
                        tool_name,
                    }),
                    _ => None,
                };
                if let Some(event) = event {
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
        };

        let (result, ()) = tokio::join!(turn, forward);
        result
    }

    fn task_manager(&self) -> Arc<TaskManager> {
        Agent::task_manager(self)
    }
}

/// A long-lived session around an agent.
pub struct AgentSession {
    agent: Arc<dyn SessionAgent>,
    input_tx: mpsc::UnboundedSender<String>,
    input_rx: StdMutex<Option<mpsc::UnboundedReceiver<String>>>,
    // Subscribed at construction so task events raised before the stream is
    // first polled are not lost.
    task_events: StdMutex<Option<broadcast::Receiver<TaskEvent>>>,
    stop: CancellationToken,
}

impl AgentSession {
    /// Create a session that auto-processes task completions.
    pub fn new(agent: Arc<dyn SessionAgent>) -> Self {
        Self::with_auto_process(agent, true)
    }

    /// Create a session, choosing whether task completions trigger follow-up
    /// turns.
    pub fn with_auto_process(
        agent: Arc<dyn SessionAgent>,
        auto_process_task_completions: bool,
    ) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let task_events = auto_process_task_completions
            .then(|| agent.task_manager().subscribe());
        Self {
            agent,
            input_tx,
            input_rx: StdMutex::new(Some(input_rx)),
            task_events: StdMutex::new(task_events),
            stop: CancellationToken::new(),
        }
    }

    /// Queue a user message as the next stimulus.
    pub fn send_message(&self, text: impl Into<String>) -> Result<()> {
        self.input_tx
            .send(text.into())
            .map_err(|_| AgentError::validation("session loop has stopped"))
    }

    /// Stop the loop; the stream ends after the current turn.
    pub fn stop(&self) {
        info!("Session stop requested");
        self.stop.cancel();
    }

    /// Run the session loop as an event stream.
    ///
    /// The loop yields `waiting_for_input` when idle, then blocks on the
    /// next stimulus: a queued message or a task completion event. Task
    /// events for ids no longer registered with the task manager were
    /// consumed inside an earlier generation and are silently discarded.
    pub fn run(&self) -> impl Stream<Item = SessionOutput> + Send + use<> {
        let agent = self.agent.clone();
        let stop = self.stop.clone();
        let input_rx = self
            .input_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let mut task_events = self
            .task_events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        stream! {
            let Some(mut input_rx) = input_rx else {
                return;
            };

            loop {
                yield SessionOutput::WaitingForInput;

                let stimulus = tokio::select! {
                    () = stop.cancelled() => Stimulus::Stop,
                    message = input_rx.recv() => match message {
                        Some(message) => Stimulus::Message(message),
                        None => Stimulus::Stop,
                    },
                    event = next_task_event(&mut task_events) => Stimulus::Task(event),
                };

                match stimulus {
                    Stimulus::Stop => break,

                    Stimulus::Message(message) => {
                        debug!("Session received user message");
                        for event in run_turn(agent.as_ref(), message).await {
                            yield event;
                        }
                    }

                    Stimulus::Task(None) => {
                        // Channel closed; stop listening for task events.
                        task_events = None;
                    }

                    Stimulus::Task(Some(event)) => {
                        let task_id = event.task_id().to_string();
                        if !agent.task_manager().is_registered(&task_id).await {
                            // Already consumed via the task_output tool in an
                            // earlier generation.
                            debug!(task_id, "Discarding task event for consumed task");
                            continue;
                        }

                        let prompt = match &event {
                            TaskEvent::Completed { task } => {
                                yield SessionOutput::TaskCompleted { task_id: task_id.clone() };
                                format!(
                                    "Background task {task_id} completed with result:\n{}",
                                    task.result.as_deref().unwrap_or("(no result)")
                                )
                            }
                            TaskEvent::Failed { task } => {
                                yield SessionOutput::TaskFailed { task_id: task_id.clone() };
                                format!(
                                    "Background task {task_id} failed with error:\n{}",
                                    task.error.as_deref().unwrap_or("(no error recorded)")
                                )
                            }
                        };

                        for event in run_turn(agent.as_ref(), prompt).await {
                            yield event;
                        }
                        agent.task_manager().remove(&task_id).await;
                    }
                }
            }
        }
    }
}

enum Stimulus {
    Stop,
    Message(String),
    Task(Option<TaskEvent>),
}

/// Run one turn, collecting the streamed lifecycle events and the terminal
/// event in order.
async fn run_turn(agent: &dyn SessionAgent, prompt: String) -> Vec<SessionOutput> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let result = agent.stream_turn(prompt, events_tx).await;

    let mut events = Vec::new();
    while let Ok(event) = events_rx.try_recv() {
        events.push(event);
    }
    match result {
        Ok(result) => events.push(SessionOutput::GenerationComplete { result }),
        Err(e) => events.push(SessionOutput::GenerationFailed {
            error: e.to_string(),
        }),
    }
    events
}

async fn next_task_event(
    events: &mut Option<broadcast::Receiver<TaskEvent>>,
) -> Option<TaskEvent> {
    match events {
        Some(rx) => loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "session.test.rs"]
mod tests;
