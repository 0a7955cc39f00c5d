use super::*;
use crate::context::InterruptResponses;
use std::sync::Arc;
use std::sync::Mutex;
use tandem_protocol::ConversationState;
use tandem_protocol::ToolResultOutput;

fn ctx(state: Arc<Mutex<ConversationState>>) -> ToolContext {
    ToolContext::new("call_1", "write", state, InterruptResponses::new())
}

#[tokio::test]
async fn test_write_creates_file_record() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state.clone());

    let output = WriteTool::new()
        .execute(
            serde_json::json!({"file_path": "/t.txt", "content": "one\ntwo"}),
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(!output.is_error);
    match output.content {
        ToolResultOutput::Json { value } => {
            assert_eq!(value["file_path"], "/t.txt");
            assert_eq!(value["lines"], 2);
        }
        ToolResultOutput::Text { .. } => panic!("expected json output"),
    }

    let state = state.lock().unwrap();
    assert_eq!(state.file_content("/t.txt").unwrap(), "one\ntwo");
}

#[tokio::test]
async fn test_write_replaces_content() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state.clone());
    let tool = WriteTool::new();

    tool.execute(
        serde_json::json!({"file_path": "/t.txt", "content": "v1"}),
        &mut ctx,
    )
    .await
    .unwrap();
    tool.execute(
        serde_json::json!({"file_path": "/t.txt", "content": "v2"}),
        &mut ctx,
    )
    .await
    .unwrap();

    assert_eq!(state.lock().unwrap().file_content("/t.txt").unwrap(), "v2");
}

#[tokio::test]
async fn test_missing_field_is_validation_error() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ctx(state);

    let failure = WriteTool::new()
        .execute(serde_json::json!({"file_path": "/t.txt"}), &mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(failure, ToolFailure::Error(_)));
}

#[test]
fn test_write_is_edit_family() {
    assert!(WriteTool::new().is_edit_tool());
}
