use super::*;
use crate::builtin::WriteTool;
use crate::context::InterruptResponses;
use std::sync::Arc;
use std::sync::Mutex;
use tandem_protocol::ConversationState;
use tandem_protocol::ToolResultOutput;

async fn seeded_ctx(content: &str) -> (Arc<Mutex<ConversationState>>, ToolContext) {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ToolContext::new("call_0", "write", state.clone(), InterruptResponses::new());
    WriteTool::new()
        .execute(
            serde_json::json!({"file_path": "/f.txt", "content": content}),
            &mut ctx,
        )
        .await
        .unwrap();
    let ctx = ToolContext::new("call_1", "edit", state.clone(), InterruptResponses::new());
    (state, ctx)
}

#[tokio::test]
async fn test_unique_replacement() {
    let (state, mut ctx) = seeded_ctx("hello world").await;

    let output = EditTool::new()
        .execute(
            serde_json::json!({
                "file_path": "/f.txt",
                "old_string": "world",
                "new_string": "tandem"
            }),
            &mut ctx,
        )
        .await
        .unwrap();

    assert!(!output.is_error);
    assert_eq!(
        state.lock().unwrap().file_content("/f.txt").unwrap(),
        "hello tandem"
    );
}

#[tokio::test]
async fn test_ambiguous_match_requires_replace_all() {
    let (state, mut ctx) = seeded_ctx("aaa bbb aaa").await;

    let output = EditTool::new()
        .execute(
            serde_json::json!({
                "file_path": "/f.txt",
                "old_string": "aaa",
                "new_string": "ccc"
            }),
            &mut ctx,
        )
        .await
        .unwrap();
    assert!(output.is_error);
    // Unchanged on ambiguity.
    assert_eq!(
        state.lock().unwrap().file_content("/f.txt").unwrap(),
        "aaa bbb aaa"
    );

    let output = EditTool::new()
        .execute(
            serde_json::json!({
                "file_path": "/f.txt",
                "old_string": "aaa",
                "new_string": "ccc",
                "replace_all": true
            }),
            &mut ctx,
        )
        .await
        .unwrap();
    assert!(!output.is_error);
    match output.content {
        ToolResultOutput::Json { value } => assert_eq!(value["replaced"], 2),
        ToolResultOutput::Text { .. } => panic!("expected json output"),
    }
    assert_eq!(
        state.lock().unwrap().file_content("/f.txt").unwrap(),
        "ccc bbb ccc"
    );
}

#[tokio::test]
async fn test_missing_file_is_tool_error_output() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let mut ctx = ToolContext::new("call_1", "edit", state, InterruptResponses::new());

    let output = EditTool::new()
        .execute(
            serde_json::json!({
                "file_path": "/nope.txt",
                "old_string": "a",
                "new_string": "b"
            }),
            &mut ctx,
        )
        .await
        .unwrap();
    assert!(output.is_error);
}

#[tokio::test]
async fn test_not_found_string() {
    let (_, mut ctx) = seeded_ctx("content").await;
    let output = EditTool::new()
        .execute(
            serde_json::json!({
                "file_path": "/f.txt",
                "old_string": "absent",
                "new_string": "x"
            }),
            &mut ctx,
        )
        .await
        .unwrap();
    assert!(output.is_error);
}

#[test]
fn test_edit_is_edit_family() {
    assert!(EditTool::new().is_edit_tool());
}
