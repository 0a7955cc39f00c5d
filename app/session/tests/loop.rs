//! Session loop driving a real agent with background task delegation.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use futures::StreamExt;
use serde_json::json;
use tandem_agent::Agent;
use tandem_agent::SubagentDefinition;
use tandem_driver::GenerateRequest;
use tandem_driver::GenerateResponse;
use tandem_driver::ModelDriver;
use tandem_error::Result;
use tandem_protocol::ContentPart;
use tandem_protocol::FinishReason;
use tandem_protocol::TokenUsage;
use tandem_session::AgentSession;
use tandem_session::SessionOutput;
use tokio::time::timeout;

enum Step {
    Text(&'static str),
    ToolCall {
        id: &'static str,
        name: &'static str,
        args: serde_json::Value,
    },
}

struct MockDriver {
    steps: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<String>>,
}

impl MockDriver {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelDriver for MockDriver {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.text())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Text(text)) => {
                Ok(GenerateResponse::text_response(text, TokenUsage::new(10, 5)))
            }
            Some(Step::ToolCall { id, name, args }) => Ok(GenerateResponse {
                content: vec![ContentPart::ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    args,
                }],
                usage: TokenUsage::new(10, 5),
                finish_reason: FinishReason::ToolCalls,
            }),
            None => Ok(GenerateResponse::text_response("idle", TokenUsage::default())),
        }
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
async fn delegated_task_completion_feeds_back_into_session() {
    // Turn 1: the model delegates to a subagent, then acknowledges. The
    // subagent's own generation returns the findings. The completion event
    // then triggers a synthetic follow-up turn.
    let driver = MockDriver::new(vec![
        Step::ToolCall {
            id: "call_task",
            name: "task",
            args: json!({"subagent_type": "researcher", "description": "investigate"}),
        },
        Step::Text("delegated"),
        Step::Text("incorporated the findings"),
    ]);
    let child_driver = MockDriver::new(vec![Step::Text("subagent findings")]);

    let agent = Arc::new(
        Agent::builder()
            .model(driver.clone())
            .subagent(
                SubagentDefinition::new("researcher", "Researches", "You research.")
                    .with_driver(child_driver),
            )
            .permission_mode(tandem_protocol::PermissionMode::BypassPermissions)
            .build()
            .unwrap(),
    );

    let session = AgentSession::new(agent);
    session.send_message("please investigate").unwrap();
    let mut stream = Box::pin(session.run());

    // Idle, then the delegating turn with its tool events.
    assert!(matches!(
        next_event(&mut stream).await,
        SessionOutput::WaitingForInput
    ));

    let mut saw_tool_call = false;
    let mut saw_tool_result = false;
    loop {
        match next_event(&mut stream).await {
            SessionOutput::ToolCall { tool_name, .. } if tool_name == "task" => {
                saw_tool_call = true;
            }
            SessionOutput::ToolResult { tool_name, .. } if tool_name == "task" => {
                saw_tool_result = true;
            }
            SessionOutput::GenerationComplete { result } => {
                assert_eq!(result.text(), Some("delegated"));
                break;
            }
            SessionOutput::GenerationFailed { error } => panic!("turn failed: {error}"),
            _ => {}
        }
    }
    assert!(saw_tool_call);
    assert!(saw_tool_result);

    // The background completion pushes a synthetic follow-up turn.
    let mut saw_task_completed = false;
    loop {
        match next_event(&mut stream).await {
            SessionOutput::TaskCompleted { .. } => saw_task_completed = true,
            SessionOutput::GenerationComplete { result } => {
                assert_eq!(result.text(), Some("incorporated the findings"));
                break;
            }
            SessionOutput::GenerationFailed { error } => panic!("follow-up failed: {error}"),
            _ => {}
        }
    }
    assert!(saw_task_completed);

    // The synthetic prompt referenced the task result.
    let prompts = driver.prompts();
    assert!(prompts
        .iter()
        .any(|p| p.contains("completed with result") && p.contains("subagent findings")));

    session.stop();
}
