//! End-to-end turn scenarios against scripted model drivers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tandem_agent::Agent;
use tandem_agent::GenerateOptions;
use tandem_context::ContextManager;
use tandem_driver::GenerateRequest;
use tandem_driver::GenerateResponse;
use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_permissions::FnCanUseTool;
use tandem_protocol::CompactionPolicy;
use tandem_protocol::CompactionResult;
use tandem_protocol::ContentPart;
use tandem_protocol::ContextConfig;
use tandem_protocol::FinishReason;
use tandem_protocol::MessageContent;
use tandem_protocol::PermissionBehavior;
use tandem_protocol::PermissionMode;
use tandem_protocol::Role;
use tandem_protocol::SummarizationConfig;
use tandem_protocol::TokenUsage;
use tandem_protocol::ToolResultOutput;
use tandem_protocol::TurnResult;
use tandem_store::Checkpointer;
use tandem_store::MemoryCheckpointer;
use tandem_tools::InterruptSignal;
use tandem_tools::Tool;
use tandem_tools::ToolContext;
use tandem_tools::ToolFailure;
use tandem_tools::ToolOutput;
use tandem_tools::builtin::WriteTool;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

enum Step {
    Text(&'static str),
    ToolCall {
        id: &'static str,
        name: &'static str,
        args: serde_json::Value,
    },
    Fail(&'static str),
}

struct MockDriver {
    name: &'static str,
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl MockDriver {
    fn new(name: &'static str, steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            name,
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request(&self, index: usize) -> GenerateRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl ModelDriver for MockDriver {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.requests.lock().unwrap().push(request);
        match self.steps.lock().unwrap().pop_front() {
            Some(Step::Text(text)) => {
                Ok(GenerateResponse::text_response(text, TokenUsage::new(20, 10)))
            }
            Some(Step::ToolCall { id, name, args }) => Ok(GenerateResponse {
                content: vec![ContentPart::ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    args,
                }],
                usage: TokenUsage::new(20, 10),
                finish_reason: FinishReason::ToolCalls,
            }),
            Some(Step::Fail(message)) => {
                Err(AgentError::new(ErrorCode::classify(message), message))
            }
            None => Ok(GenerateResponse::text_response("", TokenUsage::default())),
        }
    }
}

/// S1: happy path.
#[tokio::test]
async fn scenario_happy_path() {
    init_tracing();
    let driver = MockDriver::new("primary", vec![Step::Text("Hello, world!")]);
    let agent = Agent::builder()
        .model(driver.clone())
        .system_prompt("You are an assistant.")
        .build()
        .unwrap();

    let result = agent
        .generate(GenerateOptions::prompt("Say hello"))
        .await
        .unwrap();

    assert_eq!(result.text(), Some("Hello, world!"));
    match result {
        TurnResult::Complete { finish_reason, .. } => {
            assert_eq!(finish_reason, FinishReason::Stop);
        }
        TurnResult::Interrupted { .. } => panic!("expected completion"),
    }

    // The model saw a user message with the prompt content.
    let request = driver.request(0);
    let user = request
        .messages
        .iter()
        .find(|m| m.role == Role::User)
        .unwrap();
    assert_eq!(user.text(), "Say hello");
}

/// S2: plan mode blocks writes.
#[tokio::test]
async fn scenario_plan_mode_blocks_writes() {
    let driver = MockDriver::new(
        "primary",
        vec![
            Step::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/t.txt", "content": "x"}),
            },
            Step::Text("acknowledged"),
        ],
    );
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = Agent::builder()
        .model(driver.clone())
        .tool(Arc::new(WriteTool::new()))
        .checkpointer(checkpointer.clone())
        .permission_mode(PermissionMode::Plan)
        .build()
        .unwrap();

    agent
        .generate(GenerateOptions::prompt("write something").with_thread_id("t"))
        .await
        .unwrap();

    // The rejection is a TOOL_ERROR shaped result the model can read.
    let checkpoint = checkpointer.load("t").await.unwrap().unwrap();
    let rejection = checkpoint
        .messages
        .iter()
        .find_map(|m| match &m.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::ToolResult { id, output, .. } if id == "call_1" => {
                    Some(output.render())
                }
                _ => None,
            }),
            MessageContent::Text(_) => None,
        })
        .unwrap();
    assert!(rejection.contains("blocked in plan mode"));

    // The file was never written.
    assert!(checkpoint.state.files.is_empty());
}

/// S3: approval round-trip.
#[tokio::test]
async fn scenario_approval_round_trip() {
    let driver = MockDriver::new(
        "primary",
        vec![
            Step::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/a", "content": "b"}),
            },
            Step::Text("all done"),
        ],
    );
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = Agent::builder()
        .model(driver.clone())
        .tool(Arc::new(WriteTool::new()))
        .checkpointer(checkpointer.clone())
        .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
            PermissionBehavior::Ask
        })))
        .build()
        .unwrap();

    let result = agent
        .generate(GenerateOptions::prompt("write it").with_thread_id("t"))
        .await
        .unwrap();
    assert_eq!(result.interrupt().unwrap().id, "int_call_1");

    let result = agent
        .resume("t", "int_call_1", json!({"approved": true}))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("all done"));

    // The checkpoint contains a tool message whose content carries the
    // discriminated tool-result for call_1.
    let checkpoint = checkpointer.load("t").await.unwrap().unwrap();
    let output = checkpoint
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .find_map(|m| match &m.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::ToolResult { id, output, .. } if id == "call_1" => {
                    Some(output.clone())
                }
                _ => None,
            }),
            MessageContent::Text(_) => None,
        })
        .unwrap();
    assert!(matches!(
        output,
        ToolResultOutput::Json { .. } | ToolResultOutput::Text { .. }
    ));
    assert!(checkpoint.state.files.contains_key("/a"));
}

/// S3 (denial half): the tool never executes and the output says denied.
#[tokio::test]
async fn scenario_approval_denied() {
    struct TrackedWrite {
        executions: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl Tool for TrackedWrite {
        fn name(&self) -> &str {
            "write"
        }
        fn description(&self) -> &str {
            "Tracked write"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn is_edit_tool(&self) -> bool {
            true
        }
        async fn execute(
            &self,
            _input: serde_json::Value,
            _ctx: &mut ToolContext,
        ) -> std::result::Result<ToolOutput, ToolFailure> {
            self.executions
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ToolOutput::text("wrote"))
        }
    }

    let executions = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let driver = MockDriver::new(
        "primary",
        vec![
            Step::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/a", "content": "b"}),
            },
            Step::Text("understood"),
        ],
    );
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = Agent::builder()
        .model(driver)
        .tool(Arc::new(TrackedWrite {
            executions: executions.clone(),
        }))
        .checkpointer(checkpointer.clone())
        .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
            PermissionBehavior::Ask
        })))
        .build()
        .unwrap();

    agent
        .generate(GenerateOptions::prompt("write it").with_thread_id("t"))
        .await
        .unwrap();
    agent
        .resume("t", "int_call_1", json!({"approved": false}))
        .await
        .unwrap();

    assert_eq!(executions.load(std::sync::atomic::Ordering::SeqCst), 0);

    let checkpoint = checkpointer.load("t").await.unwrap().unwrap();
    let denial = checkpoint
        .messages
        .iter()
        .find_map(|m| match &m.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::ToolResult { id, output, .. } if id == "call_1" => {
                    Some(output.clone())
                }
                _ => None,
            }),
            MessageContent::Text(_) => None,
        })
        .unwrap();
    match denial {
        ToolResultOutput::Text { value } => assert!(value.contains("denied")),
        ToolResultOutput::Json { .. } => panic!("denial must be the text form"),
    }
}

/// S4: compaction threshold.
#[tokio::test]
async fn scenario_compaction_threshold() {
    let steps: Vec<Step> = (0..8).map(|_| Step::Text("a reasonably long answer that eats context window budget")).collect();
    let driver = MockDriver::new("primary", steps);

    let compactions = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let compactions_sink = compactions.clone();

    let context = ContextManager::new(ContextConfig {
        max_tokens: 100,
        policy: CompactionPolicy {
            enabled: true,
            token_threshold: 0.1,
            hard_cap_threshold: 0.95,
        },
        summarization: SummarizationConfig {
            keep_message_count: 2,
            ..Default::default()
        },
        scheduler: None,
    })
    .with_on_compact(Arc::new(move |result: &CompactionResult| {
        compactions_sink
            .lock()
            .unwrap()
            .push((result.messages_before, result.messages_after));
    }));

    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = Agent::builder()
        .model(driver)
        .system_prompt("assistant")
        .checkpointer(checkpointer.clone())
        .context_manager(Arc::new(context))
        .build()
        .unwrap();

    for i in 0..8 {
        agent
            .generate(
                GenerateOptions::prompt(format!(
                    "turn {i}: please elaborate at great length about the topic"
                ))
                .with_thread_id("t"),
            )
            .await
            .unwrap();
    }

    let compactions = compactions.lock().unwrap();
    assert!(!compactions.is_empty());
    for (before, after) in compactions.iter() {
        assert!(after < before);
    }

    // The synthetic summary message is a user message with the prefix.
    let checkpoint = checkpointer.load("t").await.unwrap().unwrap();
    let summary = checkpoint
        .messages
        .iter()
        .find(|m| m.text().starts_with("## Conversation Summary"))
        .unwrap();
    assert_eq!(summary.role, Role::User);
}

/// S5: fallback on rate limit.
#[tokio::test]
async fn scenario_fallback_on_rate_limit() {
    let primary = MockDriver::new("primary", vec![Step::Fail("rate limit exceeded")]);
    let fallback = MockDriver::new("fallback", vec![Step::Text("Fallback response")]);
    let agent = Agent::builder()
        .model(primary.clone())
        .fallback_model(fallback.clone())
        .build()
        .unwrap();

    let result = agent
        .generate(GenerateOptions::prompt("hello"))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("Fallback response"));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

/// S5 (second half): a rate-limited fallback surfaces after exactly two
/// calls.
#[tokio::test]
async fn scenario_fallback_also_rate_limited() {
    let primary = MockDriver::new("primary", vec![Step::Fail("rate limit exceeded")]);
    let fallback = MockDriver::new("fallback", vec![Step::Fail("rate limit exceeded")]);
    let agent = Agent::builder()
        .model(primary.clone())
        .fallback_model(fallback.clone())
        .build()
        .unwrap();

    let err = agent
        .generate(GenerateOptions::prompt("hello"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RateLimit);
    assert_eq!(primary.call_count() + fallback.call_count(), 2);
}

/// S6: first-turn interrupt persistence.
#[tokio::test]
async fn scenario_first_turn_interrupt_persists() {
    struct AskOnce;

    #[async_trait]
    impl Tool for AskOnce {
        fn name(&self) -> &str {
            "ask"
        }
        fn description(&self) -> &str {
            "Asks the user"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(
            &self,
            _input: serde_json::Value,
            ctx: &mut ToolContext,
        ) -> std::result::Result<ToolOutput, ToolFailure> {
            let answer = ctx.interrupt(json!({"question": "which color?"}))?;
            Ok(ToolOutput::json(json!({"answer": answer})))
        }
    }

    let driver = MockDriver::new(
        "primary",
        vec![
            Step::ToolCall {
                id: "call_5",
                name: "ask",
                args: json!({}),
            },
            Step::Text("noted"),
        ],
    );
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = Agent::builder()
        .model(driver)
        .tool(Arc::new(AskOnce))
        .checkpointer(checkpointer.clone())
        .build()
        .unwrap();

    // Very first turn for this thread ends in an interrupt: the checkpoint
    // must be created, not conditionally skipped.
    let result = agent
        .generate(GenerateOptions::prompt("ask me").with_thread_id("fresh-thread"))
        .await
        .unwrap();
    assert!(result.is_interrupted());

    let checkpoint = checkpointer.load("fresh-thread").await.unwrap().unwrap();
    let pending = checkpoint.pending_interrupt.unwrap();
    assert_eq!(pending.id, "int_call_5");
    assert_eq!(pending.thread_id, "fresh-thread");

    // And the thread is resumable.
    let result = agent
        .resume("fresh-thread", "int_call_5", json!("blue"))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("noted"));
}

/// Interrupt signals are control flow, not errors: they never pass through
/// wrap_error and keep their payload intact.
#[test]
fn interrupt_signal_is_not_an_error() {
    let signal = InterruptSignal {
        tool_call_id: "call_1".to_string(),
        tool_name: "ask".to_string(),
        request: json!({"q": 1}),
        kind: tandem_protocol::InterruptKind::Custom,
    };
    let failure = ToolFailure::Interrupt(signal);
    assert!(failure.as_interrupt().is_some());
}
