use super::*;
use crate::options::GenerateOptions;
use crate::testing::ScriptStep;
use crate::testing::ScriptedDriver;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_error::ErrorCode;
use tandem_permissions::FnCanUseTool;
use tandem_protocol::PermissionBehavior;
use tandem_store::Checkpointer;
use tandem_store::MemoryCheckpointer;
use tandem_tools::Tool;
use tandem_tools::ToolContext;
use tandem_tools::ToolFailure;
use tandem_tools::ToolOutput;
use tandem_tools::builtin::WriteTool;

/// A tool that asks for user data via interrupt, a configurable number of
/// times.
struct AskTool {
    interrupts_needed: usize,
    executions: Arc<AtomicUsize>,
}

#[async_trait]
impl Tool for AskTool {
    fn name(&self) -> &str {
        "ask"
    }

    fn description(&self) -> &str {
        "Asks the user questions"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }

    async fn execute(
        &self,
        _input: serde_json::Value,
        ctx: &mut ToolContext,
    ) -> std::result::Result<ToolOutput, ToolFailure> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        // Each execution restarts from scratch, so a caller answering the
        // second question must resend the earlier answers too (an array
        // response carries the accumulated answers).
        let mut answers: Vec<serde_json::Value> = Vec::new();
        while answers.len() < self.interrupts_needed {
            let response = ctx.interrupt(json!({"question": format!("q{}", answers.len())}))?;
            match response {
                serde_json::Value::Array(batch) => answers.extend(batch),
                single => answers.push(single),
            }
        }
        Ok(ToolOutput::json(json!({"answers": answers})))
    }
}

struct Harness {
    agent: Agent,
    checkpointer: Arc<MemoryCheckpointer>,
    executions: Arc<AtomicUsize>,
}

fn approval_harness(script: Vec<ScriptStep>) -> Harness {
    let driver = Arc::new(ScriptedDriver::new("primary", script));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let agent = Agent::builder()
        .model(driver)
        .system_prompt("assistant")
        .tool(Arc::new(WriteTool::new()))
        .checkpointer(checkpointer.clone())
        .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
            PermissionBehavior::Ask
        })))
        .build()
        .unwrap();
    Harness {
        agent,
        checkpointer,
        executions,
    }
}

fn custom_harness(interrupts_needed: usize, script: Vec<ScriptStep>) -> Harness {
    let driver = Arc::new(ScriptedDriver::new("primary", script));
    let checkpointer = Arc::new(MemoryCheckpointer::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let agent = Agent::builder()
        .model(driver)
        .system_prompt("assistant")
        .tool(Arc::new(AskTool {
            interrupts_needed,
            executions: executions.clone(),
        }))
        .checkpointer(checkpointer.clone())
        .build()
        .unwrap();
    Harness {
        agent,
        checkpointer,
        executions,
    }
}

#[tokio::test]
async fn test_approval_round_trip() {
    let harness = approval_harness(vec![
        ScriptStep::ToolCall {
            id: "call_1",
            name: "write",
            args: json!({"file_path": "/a", "content": "b"}),
        },
        ScriptStep::Text("file written"),
    ]);

    let result = harness
        .agent
        .generate(GenerateOptions::prompt("write it").with_thread_id("t1"))
        .await
        .unwrap();
    assert_eq!(result.interrupt().unwrap().id, "int_call_1");

    let result = harness
        .agent
        .resume("t1", "int_call_1", json!({"approved": true}))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("file written"));

    // The checkpoint holds a tool message with the discriminated result and
    // no pending interrupt.
    let checkpoint = harness.checkpointer.load("t1").await.unwrap().unwrap();
    assert!(checkpoint.pending_interrupt.is_none());
    assert!(checkpoint.state.files.contains_key("/a"));

    let result_part = checkpoint.messages.iter().find_map(|m| match &m.content {
        tandem_protocol::MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ContentPart::ToolResult { id, output, .. } if id == "call_1" => Some(output.clone()),
            _ => None,
        }),
        _ => None,
    });
    assert!(matches!(
        result_part,
        Some(ToolResultOutput::Json { .. }) | Some(ToolResultOutput::Text { .. })
    ));
}

#[tokio::test]
async fn test_approval_denial_skips_tool() {
    let executions = Arc::new(AtomicUsize::new(0));
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "counting",
                args: json!({}),
            },
            ScriptStep::Text("understood"),
        ],
    ));
    let checkpointer = Arc::new(MemoryCheckpointer::new());

    struct CountingTool {
        executions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Tool for CountingTool {
        fn name(&self) -> &str {
            "counting"
        }
        fn description(&self) -> &str {
            "Counts"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(
            &self,
            _input: serde_json::Value,
            _ctx: &mut ToolContext,
        ) -> std::result::Result<ToolOutput, ToolFailure> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(ToolOutput::text("ran"))
        }
    }

    let agent = Agent::builder()
        .model(driver)
        .tool(Arc::new(CountingTool {
            executions: executions.clone(),
        }))
        .checkpointer(checkpointer.clone())
        .can_use_tool(Arc::new(FnCanUseTool::new(|_, _| async {
            PermissionBehavior::Ask
        })))
        .build()
        .unwrap();

    agent
        .generate(GenerateOptions::prompt("go").with_thread_id("t1"))
        .await
        .unwrap();
    let result = agent
        .resume("t1", "int_call_1", json!({"approved": false}))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("understood"));

    // The tool never ran; the synthesized result mentions the denial.
    assert_eq!(executions.load(Ordering::SeqCst), 0);
    let checkpoint = checkpointer.load("t1").await.unwrap().unwrap();
    let denial = checkpoint.messages.iter().find_map(|m| match &m.content {
        tandem_protocol::MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
            ContentPart::ToolResult { id, output, .. } if id == "call_1" => Some(output.render()),
            _ => None,
        }),
        _ => None,
    });
    assert!(denial.unwrap().contains("denied"));
}

#[tokio::test]
async fn test_custom_interrupt_round_trip() {
    let harness = custom_harness(
        1,
        vec![
            ScriptStep::ToolCall {
                id: "call_7",
                name: "ask",
                args: json!({}),
            },
            ScriptStep::Text("thanks"),
        ],
    );

    // First turn: the tool interrupts; this is the thread's very first turn,
    // so the checkpoint must be created, not skipped.
    let result = harness
        .agent
        .generate(GenerateOptions::prompt("ask me").with_thread_id("t1"))
        .await
        .unwrap();
    let interrupt = result.interrupt().unwrap();
    assert_eq!(interrupt.id, "int_call_7");
    assert_eq!(interrupt.kind, InterruptKind::Custom);
    assert_eq!(interrupt.request, json!({"question": "q0"}));

    let checkpoint = harness.checkpointer.load("t1").await.unwrap().unwrap();
    assert_eq!(checkpoint.pending_interrupt.unwrap().id, "int_call_7");

    // Resume delivers the answer; the tool re-runs and consumes it once.
    let result = harness
        .agent
        .resume("t1", "int_call_7", json!({"answer": 42}))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("thanks"));
    assert_eq!(harness.executions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_custom_reinterrupt_persists_new_pending() {
    let harness = custom_harness(
        2,
        vec![
            ScriptStep::ToolCall {
                id: "call_9",
                name: "ask",
                args: json!({}),
            },
            ScriptStep::Text("all answered"),
        ],
    );

    harness
        .agent
        .generate(GenerateOptions::prompt("ask twice").with_thread_id("t1"))
        .await
        .unwrap();

    // First resume answers q0; the tool immediately asks q1 again.
    let result = harness
        .agent
        .resume("t1", "int_call_9", json!(["answer-0"]))
        .await
        .unwrap();
    let interrupt = result.interrupt().unwrap();
    assert_eq!(interrupt.id, "int_call_9");
    assert_eq!(interrupt.request, json!({"question": "q1"}));

    let checkpoint = harness.checkpointer.load("t1").await.unwrap().unwrap();
    assert!(checkpoint.pending_interrupt.is_some());

    // Second resume carries both answers; the tool completes.
    let result = harness
        .agent
        .resume("t1", "int_call_9", json!(["answer-0", "answer-1"]))
        .await
        .unwrap();
    assert_eq!(result.text(), Some("all answered"));
}

#[tokio::test]
async fn test_resume_validation_errors() {
    let harness = custom_harness(1, vec![]);

    // No checkpoint at all.
    let err = harness
        .agent
        .resume("missing", "int_x", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("no checkpoint"));

    // Checkpoint without a pending interrupt.
    harness
        .checkpointer
        .save(tandem_protocol::Checkpoint::new("settled"))
        .await
        .unwrap();
    let err = harness
        .agent
        .resume("settled", "int_x", json!({}))
        .await
        .unwrap_err();
    assert!(err.message.contains("no pending interrupt"));
}

#[tokio::test]
async fn test_resume_id_mismatch() {
    let harness = custom_harness(
        1,
        vec![ScriptStep::ToolCall {
            id: "call_1",
            name: "ask",
            args: json!({}),
        }],
    );
    harness
        .agent
        .generate(GenerateOptions::prompt("go").with_thread_id("t1"))
        .await
        .unwrap();

    let err = harness
        .agent
        .resume("t1", "int_wrong", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("mismatch"));
    assert!(err.message.contains("int_call_1"));
}

#[tokio::test]
async fn test_resume_without_checkpointer() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![]));
    let agent = Agent::builder().model(driver).build().unwrap();

    let err = agent.resume("t1", "int_x", json!({})).await.unwrap_err();
    assert!(err.message.contains("checkpointer"));
}

#[tokio::test]
async fn test_approval_response_requires_bool() {
    let harness = approval_harness(vec![ScriptStep::ToolCall {
        id: "call_1",
        name: "write",
        args: json!({"file_path": "/a", "content": "b"}),
    }]);
    harness
        .agent
        .generate(GenerateOptions::prompt("go").with_thread_id("t1"))
        .await
        .unwrap();

    let err = harness
        .agent
        .resume("t1", "int_call_1", json!({"yes": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("approved"));
    let _ = harness.executions;
}
