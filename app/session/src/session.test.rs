use super::*;
use futures::StreamExt;
use std::time::Duration;
use tandem_protocol::FinishReason;
use tandem_protocol::TokenUsage;
use tokio::time::timeout;

struct MockAgent {
    manager: Arc<TaskManager>,
    prompts: StdMutex<Vec<String>>,
}

impl MockAgent {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            manager: Arc::new(TaskManager::default()),
            prompts: StdMutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SessionAgent for MockAgent {
    async fn generate_turn(&self, prompt: String) -> Result<TurnResult> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt);
        Ok(TurnResult::Complete {
            text: "turn output".to_string(),
            usage: TokenUsage::new(5, 5),
            finish_reason: FinishReason::Stop,
            steps: 1,
            forked_session_id: None,
        })
    }

    fn task_manager(&self) -> Arc<TaskManager> {
        self.manager.clone()
    }
}

async fn next_event<S>(stream: &mut S) -> SessionOutput
where
    S: Stream<Item = SessionOutput> + Unpin,
{
    timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("stream stalled")
        .expect("stream ended")
}

#[tokio::test]
async fn test_waiting_for_input_when_idle() {
    let agent = MockAgent::new();
    let session = AgentSession::new(agent);
    let mut stream = Box::pin(session.run());

    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));
}

#[tokio::test]
async fn test_message_triggers_generation() {
    let agent = MockAgent::new();
    let session = AgentSession::new(agent.clone());
    session.send_message("hello there").unwrap();

    let mut stream = Box::pin(session.run());
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    match next_event(&mut stream).await {
        SessionOutput::GenerationComplete { result } => {
            assert_eq!(result.text(), Some("turn output"));
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(agent.prompts(), vec!["hello there"]);

    // Back to idle.
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));
}

#[tokio::test]
async fn test_task_completion_triggers_follow_up() {
    let agent = MockAgent::new();
    let manager = agent.task_manager();
    let session = AgentSession::new(agent.clone());
    let mut stream = Box::pin(session.run());

    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    let task = manager.create("researcher", "dig").await.unwrap();
    manager.complete(&task.id, "findings").await.unwrap();

    match next_event(&mut stream).await {
        SessionOutput::TaskCompleted { task_id } => assert_eq!(task_id, task.id),
        other => panic!("expected task completion, got {other:?}"),
    }
    match next_event(&mut stream).await {
        SessionOutput::GenerationComplete { .. } => {}
        other => panic!("expected generation, got {other:?}"),
    }

    // The synthetic prompt references the task id and its result, and the
    // task was deregistered afterwards.
    let prompts = agent.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&task.id));
    assert!(prompts[0].contains("findings"));
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));
    assert!(!manager.is_registered(&task.id).await);
}

#[tokio::test]
async fn test_task_failure_triggers_follow_up() {
    let agent = MockAgent::new();
    let manager = agent.task_manager();
    let session = AgentSession::new(agent.clone());
    let mut stream = Box::pin(session.run());

    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    let task = manager.create("researcher", "doomed").await.unwrap();
    manager.fail(&task.id, "it broke").await.unwrap();

    match next_event(&mut stream).await {
        SessionOutput::TaskFailed { task_id } => assert_eq!(task_id, task.id),
        other => panic!("expected task failure, got {other:?}"),
    }
    match next_event(&mut stream).await {
        SessionOutput::GenerationComplete { .. } => {}
        other => panic!("expected generation, got {other:?}"),
    }
    assert!(agent.prompts()[0].contains("it broke"));
}

#[tokio::test]
async fn test_consumed_task_event_is_discarded() {
    let agent = MockAgent::new();
    let manager = agent.task_manager();
    let session = AgentSession::new(agent.clone());

    // Nothing runs until the stream is polled; stage the event first.
    let task = manager.create("researcher", "dig").await.unwrap();
    manager.complete(&task.id, "findings").await.unwrap();
    // Consumed via task_output before the session processed the event.
    manager.remove(&task.id).await;

    let mut stream = Box::pin(session.run());
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    // The event is silently dropped: the loop idles again without a turn.
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));
    assert!(agent.prompts().is_empty());
}

#[tokio::test]
async fn test_auto_process_disabled() {
    let agent = MockAgent::new();
    let manager = agent.task_manager();
    let session = AgentSession::with_auto_process(agent.clone(), false);

    let task = manager.create("researcher", "dig").await.unwrap();
    manager.complete(&task.id, "findings").await.unwrap();

    let mut stream = Box::pin(session.run());
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    // No follow-up generation; sending a message still works.
    session.send_message("manual").unwrap();
    match next_event(&mut stream).await {
        SessionOutput::GenerationComplete { .. } => {}
        other => panic!("expected generation, got {other:?}"),
    }
    assert_eq!(agent.prompts(), vec!["manual"]);
}

#[tokio::test]
async fn test_stop_terminates_stream() {
    let agent = MockAgent::new();
    let session = AgentSession::new(agent);
    let mut stream = Box::pin(session.run());

    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    session.stop();
    let next = timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("stream stalled");
    assert!(next.is_none());
}

#[tokio::test]
async fn test_send_message_after_stream_drop_fails() {
    let agent = MockAgent::new();
    let session = AgentSession::new(agent);
    let stream = Box::pin(session.run());

    assert!(session.send_message("early").is_ok());
    drop(stream);
    assert!(session.send_message("late").is_err());
}

#[tokio::test]
async fn test_run_can_only_be_consumed_once() {
    let agent = MockAgent::new();
    let session = AgentSession::new(agent);
    let _first = Box::pin(session.run());

    // A second run yields an immediately-empty stream rather than stealing
    // the input channel.
    let mut second = Box::pin(session.run());
    let next = timeout(Duration::from_secs(1), second.next())
        .await
        .expect("stream stalled");
    assert!(next.is_none());
}
