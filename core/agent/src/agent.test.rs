use super::*;
use crate::builder::AgentBuilder;
use crate::options::GenerateOptions;
use pretty_assertions::assert_eq;
use crate::testing::ScriptStep;
use crate::testing::ScriptedDriver;
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering as AtomicOrdering;
use tandem_permissions::FnCanUseTool;
use tandem_protocol::PermissionBehavior;
use tandem_store::MemoryCheckpointer;
use tandem_tools::ToolOutput;
use tandem_tools::builtin::WriteTool;

fn agent_with(
    driver: Arc<ScriptedDriver>,
    configure: impl FnOnce(AgentBuilder) -> AgentBuilder,
) -> Agent {
    let builder = Agent::builder()
        .model(driver)
        .system_prompt("You are a helpful assistant.");
    configure(builder).build().unwrap()
}

/// A tool that counts executions.
struct CountingTool {
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl tandem_tools::Tool for CountingTool {
    fn name(&self) -> &str {
        "counting"
    }

    fn description(&self) -> &str {
        "Counts executions"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        _ctx: &mut ToolContext,
    ) -> std::result::Result<ToolOutput, ToolFailure> {
        self.executions.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(ToolOutput::text("counted"))
    }
}

#[test]
fn test_agent_ids_increment() {
    let a = next_agent_id();
    let b = next_agent_id();
    let a_n: u64 = a.strip_prefix("agent-").unwrap().parse().unwrap();
    let b_n: u64 = b.strip_prefix("agent-").unwrap().parse().unwrap();
    assert!(b_n > a_n);
}

#[tokio::test]
async fn test_generate_happy_path() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Text("Hello, world!")],
    ));
    let agent = agent_with(driver.clone(), |b| b);

    let result = agent
        .generate(GenerateOptions::prompt("Say hello"))
        .await
        .unwrap();

    assert_eq!(result.text(), Some("Hello, world!"));
    assert!(matches!(
        result,
        TurnResult::Complete {
            finish_reason: FinishReason::Stop,
            steps: 1,
            ..
        }
    ));

    // The request carried the system prompt first and the user turn last.
    let request = driver.request(0);
    assert_eq!(request.messages[0].role, Role::System);
    let user = request.messages.last().unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.text(), "Say hello");
}

#[tokio::test]
async fn test_generate_requires_input() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![]));
    let agent = agent_with(driver, |b| b);

    let err = agent.generate(GenerateOptions::default()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn test_tool_loop_executes_and_persists() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/t.txt", "content": "body"}),
            },
            ScriptStep::Text("wrote the file"),
        ],
    ));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = agent_with(driver.clone(), |b| {
        b.tool(Arc::new(WriteTool::new()))
            .checkpointer(checkpointer.clone())
            .permission_mode(PermissionMode::BypassPermissions)
    });

    let result = agent
        .generate(GenerateOptions::prompt("write it").with_thread_id("t1"))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("wrote the file"));
    assert_eq!(driver.call_count(), 2);

    // The settled checkpoint holds the full conversation and the state.
    let checkpoint = checkpointer.load("t1").await.unwrap().unwrap();
    assert!(checkpoint.pending_interrupt.is_none());
    tandem_protocol::validate_conversation(&checkpoint.messages).unwrap();
    assert!(checkpoint.state.files.contains_key("/t.txt"));

    let has_result = checkpoint.messages.iter().any(|m| {
        matches!(&m.content, tandem_protocol::MessageContent::Parts(parts)
            if parts.iter().any(|p| matches!(p, ContentPart::ToolResult { id, .. } if id == "call_1")))
    });
    assert!(has_result);
}

#[tokio::test]
async fn test_plan_mode_blocks_tool_as_result() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/t.txt", "content": "x"}),
            },
            ScriptStep::Text("understood"),
        ],
    ));
    let executions = Arc::new(AtomicUsize::new(0));
    let agent = agent_with(driver.clone(), |b| {
        b.tool(Arc::new(WriteTool::new()))
            .tool(Arc::new(CountingTool {
                executions: executions.clone(),
            }))
            .permission_mode(PermissionMode::Plan)
    });

    let result = agent
        .generate(GenerateOptions::prompt("write it"))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("understood"));

    // The rejection reached the model as a tool result.
    let second = driver.request(1);
    let tool_message = second.messages.iter().find(|m| m.role == Role::Tool).unwrap();
    assert!(tool_message.content.text().is_empty());
    match &tool_message.content {
        tandem_protocol::MessageContent::Parts(parts) => match &parts[0] {
            ContentPart::ToolResult { output, .. } => {
                assert!(output.render().contains("blocked in plan mode"));
            }
            _ => panic!("expected tool result"),
        },
        _ => panic!("expected parts"),
    }
    assert_eq!(executions.load(AtomicOrdering::SeqCst), 0);
}

#[tokio::test]
async fn test_deny_callback_never_executes_tool() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "counting",
                args: json!({}),
            },
            ScriptStep::Text("ok"),
        ],
    ));
    let executions = Arc::new(AtomicUsize::new(0));
    let agent = agent_with(driver, |b| {
        b.tool(Arc::new(CountingTool {
            executions: executions.clone(),
        }))
        .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
            PermissionBehavior::Deny
        })))
    });

    agent
        .generate(GenerateOptions::prompt("go"))
        .await
        .unwrap();
    assert_eq!(executions.load(AtomicOrdering::SeqCst), 0);
}

#[tokio::test]
async fn test_bypass_never_consults_callback() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "counting",
                args: json!({}),
            },
            ScriptStep::Text("ok"),
        ],
    ));
    let executions = Arc::new(AtomicUsize::new(0));
    let callback_calls = Arc::new(AtomicUsize::new(0));
    let callback_calls_inner = callback_calls.clone();

    let agent = agent_with(driver, |b| {
        b.tool(Arc::new(CountingTool {
            executions: executions.clone(),
        }))
        .permission_mode(PermissionMode::BypassPermissions)
        .can_use_tool(Arc::new(FnCanUseTool::new(move |_, _| {
            let calls = callback_calls_inner.clone();
            async move {
                calls.fetch_add(1, AtomicOrdering::SeqCst);
                PermissionBehavior::Deny
            }
        })))
    });

    agent.generate(GenerateOptions::prompt("go")).await.unwrap();
    assert_eq!(callback_calls.load(AtomicOrdering::SeqCst), 0);
    assert_eq!(executions.load(AtomicOrdering::SeqCst), 1);
}

#[tokio::test]
async fn test_ask_interrupts_with_checkpointer() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::ToolCall {
            id: "call_1",
            name: "write",
            args: json!({"file_path": "/a", "content": "b"}),
        }],
    ));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = agent_with(driver, |b| {
        b.tool(Arc::new(WriteTool::new()))
            .checkpointer(checkpointer.clone())
            .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
                PermissionBehavior::Ask
            })))
    });

    let result = agent
        .generate(GenerateOptions::prompt("write it").with_thread_id("t1"))
        .await
        .unwrap();

    let interrupt = result.interrupt().unwrap();
    assert_eq!(interrupt.id, "int_call_1");
    assert_eq!(interrupt.thread_id, "t1");
    assert_eq!(interrupt.kind, InterruptKind::Approval);
    assert!(interrupt.request["reason"]
        .as_str()
        .unwrap()
        .contains("requires user approval"));

    // Property: the checkpoint at that point carries the pending interrupt.
    let checkpoint = checkpointer.load("t1").await.unwrap().unwrap();
    assert_eq!(checkpoint.pending_interrupt.unwrap().id, "int_call_1");

    let pending = agent.get_interrupt("t1").await.unwrap().unwrap();
    assert_eq!(pending.id, "int_call_1");
}

#[tokio::test]
async fn test_fork_session_copies_history() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Text("one"), ScriptStep::Text("two")],
    ));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = agent_with(driver, |b| b.checkpointer(checkpointer.clone()));

    agent
        .generate(GenerateOptions::prompt("first").with_thread_id("source"))
        .await
        .unwrap();

    let result = agent
        .generate(
            GenerateOptions::prompt("second")
                .with_thread_id("source")
                .with_fork_session("fork"),
        )
        .await
        .unwrap();
    assert_eq!(result.forked_session_id(), Some("fork"));

    // The fork carries the source history plus the new turn.
    let fork = checkpointer.load("fork").await.unwrap().unwrap();
    let texts: Vec<String> = fork.messages.iter().map(Message::text).collect();
    assert!(texts.iter().any(|t| t == "first"));
    assert!(texts.iter().any(|t| t == "second"));

    // The source is untouched by the forked turn.
    let source = checkpointer.load("source").await.unwrap().unwrap();
    let texts: Vec<String> = source.messages.iter().map(Message::text).collect();
    assert!(!texts.iter().any(|t| t == "second"));
}

#[tokio::test]
async fn test_fork_of_missing_source_is_fresh_thread() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("hi")]));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = agent_with(driver, |b| b.checkpointer(checkpointer.clone()));

    let result = agent
        .generate(
            GenerateOptions::prompt("hello")
                .with_thread_id("ghost")
                .with_fork_session("fresh"),
        )
        .await
        .unwrap();
    assert_eq!(result.forked_session_id(), Some("fresh"));
    assert!(checkpointer.load("fresh").await.unwrap().is_some());
}

#[tokio::test]
async fn test_pre_generate_respond_with_short_circuits() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("real")]));
    let cached = TurnResult::Complete {
        text: "cached".to_string(),
        usage: TokenUsage::default(),
        finish_reason: FinishReason::Stop,
        steps: 0,
        forked_session_id: None,
    };
    let cached_clone = cached.clone();

    let agent = agent_with(driver.clone(), |b| {
        b.hook(
            HookEvent::PreGenerate,
            Arc::new(tandem_hooks::FnHook::new("cache", move |_ctx| {
                let result = cached_clone.clone();
                async move { Ok(HookOutput::RespondWith { result }) }
            })),
        )
    });

    let result = agent.generate(GenerateOptions::prompt("hi")).await.unwrap();
    assert_eq!(result.text(), Some("cached"));
    assert_eq!(driver.call_count(), 0);
}

#[tokio::test]
async fn test_pre_generate_update_input() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("ok")]));
    let agent = agent_with(driver.clone(), |b| {
        b.hook(
            HookEvent::PreGenerate,
            Arc::new(tandem_hooks::FnHook::new("rewrite", |_ctx| async {
                Ok(HookOutput::UpdateInput {
                    prompt: Some("rewritten".to_string()),
                    messages: None,
                })
            })),
        )
    });

    agent
        .generate(GenerateOptions::prompt("original"))
        .await
        .unwrap();
    let request = driver.request(0);
    assert_eq!(request.messages.last().unwrap().text(), "rewritten");
}

#[tokio::test]
async fn test_max_steps_bounds_loop() {
    // The model asks for the same tool forever.
    let steps: Vec<ScriptStep> = (0..20)
        .map(|_| ScriptStep::ToolCall {
            id: "call_x",
            name: "counting",
            args: json!({}),
        })
        .collect();
    let driver = Arc::new(ScriptedDriver::new("primary", steps));
    let executions = Arc::new(AtomicUsize::new(0));
    let agent = agent_with(driver.clone(), |b| {
        b.tool(Arc::new(CountingTool {
            executions: executions.clone(),
        }))
        .permission_mode(PermissionMode::BypassPermissions)
        .max_steps(3)
    });

    let result = agent.generate(GenerateOptions::prompt("loop")).await.unwrap();
    assert!(matches!(result, TurnResult::Complete { steps: 3, .. }));
    assert_eq!(driver.call_count(), 3);
}

#[tokio::test]
async fn test_errors_tagged_with_thread_id() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("401 unauthorized")],
    ));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let agent = agent_with(driver, |b| b.checkpointer(checkpointer));

    let err = agent
        .generate(GenerateOptions::prompt("hi").with_thread_id("t9"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Authentication);
    assert_eq!(
        err.metadata_value("threadId").and_then(|v| v.as_str()),
        Some("t9")
    );
}

#[tokio::test]
async fn test_effective_tools_respects_filters() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![]));
    let agent = agent_with(driver, |b| {
        b.tool(Arc::new(WriteTool::new()))
            .tool(Arc::new(tandem_tools::builtin::EditTool::new()))
            .disallowed_tools(vec!["edit".to_string()])
    });

    assert_eq!(agent.get_active_tools(), vec!["write"]);
}

#[test]
fn test_pending_tool_calls_skips_answered() {
    let messages = vec![
        Message::assistant_parts(vec![
            ContentPart::ToolCall {
                id: "a".to_string(),
                name: "write".to_string(),
                args: json!({}),
            },
            ContentPart::ToolCall {
                id: "b".to_string(),
                name: "edit".to_string(),
                args: json!({}),
            },
        ]),
        Message::tool_results(vec![ContentPart::ToolResult {
            id: "a".to_string(),
            name: "write".to_string(),
            output: ToolResultOutput::text("done"),
        }]),
    ];

    let pending = pending_tool_calls(&messages);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].0, "b");
}
