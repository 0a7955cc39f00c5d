use super::*;
use crate::testing::ScriptStep;
use crate::testing::ScriptedDriver;
use serde_json::json;
use std::sync::Mutex as StdMutex;
use tandem_protocol::ConversationState;
use tandem_protocol::ToolResultOutput;
use tandem_tools::InterruptResponses;

fn ctx() -> ToolContext {
    ToolContext::new(
        "call_1",
        "task",
        Arc::new(StdMutex::new(ConversationState::new())),
        InterruptResponses::new(),
    )
}

fn subagents() -> HashMap<String, SubagentDefinition> {
    let mut map = HashMap::new();
    map.insert(
        "researcher".to_string(),
        SubagentDefinition::new("researcher", "Researches", "You research."),
    );
    map
}

fn json_value(output: ToolOutput) -> serde_json::Value {
    match output.content {
        ToolResultOutput::Json { value } => value,
        ToolResultOutput::Text { value } => panic!("expected json output, got text: {value}"),
    }
}

#[tokio::test]
async fn test_task_tool_spawns_and_completes() {
    let manager = Arc::new(TaskManager::default());
    let driver = Arc::new(ScriptedDriver::new(
        "child",
        vec![ScriptStep::Text("research findings")],
    ));
    let tool = TaskTool::new(manager.clone(), subagents(), driver.clone());
    let mut events = manager.subscribe();

    let output = tool
        .execute(
            json!({"subagent_type": "researcher", "description": "dig into it"}),
            &mut ctx(),
        )
        .await
        .unwrap();
    let value = json_value(output);
    let task_id = value["task_id"].as_str().unwrap().to_string();
    assert_eq!(value["status"], "pending");

    // The child ran with the subagent's system prompt.
    match events.recv().await.unwrap() {
        tandem_tasks::TaskEvent::Completed { task } => {
            assert_eq!(task.id, task_id);
            assert_eq!(task.result.as_deref(), Some("research findings"));
        }
        tandem_tasks::TaskEvent::Failed { .. } => panic!("expected completion"),
    }
    let request = driver.request(0);
    assert_eq!(request.messages[0].role, tandem_protocol::Role::System);
    assert_eq!(request.messages[0].text(), "You research.");
}

#[tokio::test]
async fn test_task_tool_unknown_subagent() {
    let manager = Arc::new(TaskManager::default());
    let driver = Arc::new(ScriptedDriver::new("child", vec![]));
    let tool = TaskTool::new(manager, subagents(), driver);

    let output = tool
        .execute(
            json!({"subagent_type": "welder", "description": "weld"}),
            &mut ctx(),
        )
        .await
        .unwrap();
    assert!(output.is_error);
}

#[tokio::test]
async fn test_task_tool_general_purpose_without_definitions() {
    let manager = Arc::new(TaskManager::default());
    let driver = Arc::new(ScriptedDriver::new("child", vec![ScriptStep::Text("done")]));
    let tool = TaskTool::new(manager.clone(), HashMap::new(), driver);
    let mut events = manager.subscribe();

    tool.execute(json!({"description": "generic work"}), &mut ctx())
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        tandem_tasks::TaskEvent::Completed { task } => {
            assert_eq!(task.subagent_type, "general-purpose");
        }
        tandem_tasks::TaskEvent::Failed { .. } => panic!("expected completion"),
    }
}

#[tokio::test]
async fn test_task_output_blocks_then_consumes() {
    let manager = Arc::new(TaskManager::default());
    let driver = Arc::new(ScriptedDriver::new(
        "child",
        vec![ScriptStep::Text("slow result")],
    ));
    let task_tool = TaskTool::new(manager.clone(), HashMap::new(), driver);
    let output_tool = TaskOutputTool::new(manager.clone());

    let spawned = json_value(
        task_tool
            .execute(json!({"description": "work"}), &mut ctx())
            .await
            .unwrap(),
    );
    let task_id = spawned["task_id"].as_str().unwrap();

    let output = output_tool
        .execute(json!({"task_id": task_id, "block": true, "timeout": 5000}), &mut ctx())
        .await
        .unwrap();
    let value = json_value(output);
    assert_eq!(value["status"], "completed");
    assert_eq!(value["result"], "slow result");

    // Consumed: the manager no longer carries the task.
    assert!(!manager.is_registered(task_id).await);

    // A second read reports the consumption.
    let output = output_tool
        .execute(json!({"task_id": task_id}), &mut ctx())
        .await
        .unwrap();
    assert!(output.is_error);
}

#[tokio::test]
async fn test_task_output_unknown_task() {
    let manager = Arc::new(TaskManager::default());
    let tool = TaskOutputTool::new(manager);

    let output = tool
        .execute(json!({"task_id": "task_ghost"}), &mut ctx())
        .await
        .unwrap();
    assert!(output.is_error);
}

#[tokio::test]
async fn test_task_output_nonblocking_reports_status() {
    let manager = Arc::new(TaskManager::default());
    let task = manager.create("researcher", "pending work").await.unwrap();
    let tool = TaskOutputTool::new(manager.clone());

    let output = tool
        .execute(json!({"task_id": task.id, "block": false}), &mut ctx())
        .await
        .unwrap();
    let value = json_value(output);
    assert_eq!(value["status"], "pending");
    // Not consumed: the task stays registered.
    assert!(manager.is_registered(&task.id).await);
}

#[tokio::test]
async fn test_task_output_failed_task_reports_error() {
    let manager = Arc::new(TaskManager::default());
    let task = manager.create("researcher", "doomed").await.unwrap();
    manager.fail(&task.id, "exploded").await.unwrap();

    let tool = TaskOutputTool::new(manager);
    let output = tool
        .execute(json!({"task_id": task.id}), &mut ctx())
        .await
        .unwrap();
    let value = json_value(output);
    assert_eq!(value["status"], "failed");
    assert_eq!(value["error"], "exploded");
}
