use super::*;
use crate::context::InterruptResponses;
use std::sync::Arc;
use std::sync::Mutex;
use tandem_protocol::ConversationState;

fn ctx(state: Arc<Mutex<ConversationState>>) -> ToolContext {
    ToolContext::new("call_1", "todo_write", state, InterruptResponses::new())
}

#[tokio::test]
async fn test_replaces_list_atomically() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state.clone());
    let tool = TodoWriteTool::new();

    tool.execute(
        serde_json::json!({"todos": [
            {"content": "first", "status": "pending"},
            {"content": "second", "status": "in_progress"},
        ]}),
        &mut ctx,
    )
    .await
    .unwrap();
    assert_eq!(state.lock().unwrap().todos.len(), 2);

    tool.execute(
        serde_json::json!({"todos": [
            {"content": "only", "status": "completed"},
        ]}),
        &mut ctx,
    )
    .await
    .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.todos.len(), 1);
    assert_eq!(state.todos[0].status, TodoStatus::Completed);
    assert!(state.todos[0].completed_at.is_some());
}

#[tokio::test]
async fn test_at_most_one_in_progress() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state.clone());

    let output = TodoWriteTool::new()
        .execute(
            serde_json::json!({"todos": [
                {"content": "a", "status": "in_progress"},
                {"content": "b", "status": "in_progress"},
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(output.is_error);
    assert!(state.lock().unwrap().todos.is_empty());
}

#[tokio::test]
async fn test_invalid_status_rejected() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state);

    let failure = TodoWriteTool::new()
        .execute(
            serde_json::json!({"todos": [
                {"content": "a", "status": "paused"},
            ]}),
            &mut ctx,
        )
        .await
        .unwrap_err();
    assert!(matches!(failure, ToolFailure::Error(_)));
}

#[tokio::test]
async fn test_ids_preserved_or_generated() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state.clone());

    TodoWriteTool::new()
        .execute(
            serde_json::json!({"todos": [
                {"id": "todo-1", "content": "keep id", "status": "pending"},
                {"content": "generate id", "status": "pending"},
            ]}),
            &mut ctx,
        )
        .await
        .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.todos[0].id, "todo-1");
    assert!(!state.todos[1].id.is_empty());
}
