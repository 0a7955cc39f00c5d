use super::*;
use crate::context::InterruptResponses;
use std::sync::Arc;
use std::sync::Mutex;
use tandem_protocol::ConversationState;
use tandem_protocol::ToolResultOutput;

struct DummyTool;

#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str {
        "dummy"
    }

    fn description(&self) -> &str {
        "A dummy tool for testing"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "message": {"type": "string"} },
            "required": ["message"]
        })
    }

    async fn execute(
        &self,
        input: Value,
        _ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        let message = input["message"].as_str().unwrap_or_default();
        Ok(ToolOutput::text(format!("Received: {message}")))
    }
}

fn test_ctx() -> ToolContext {
    ToolContext::new(
        "call_1",
        "dummy",
        Arc::new(Mutex::new(ConversationState::new())),
        InterruptResponses::new(),
    )
}

#[tokio::test]
async fn test_execute() {
    let tool = DummyTool;
    let mut ctx = test_ctx();
    let output = tool
        .execute(serde_json::json!({"message": "hi"}), &mut ctx)
        .await
        .unwrap();
    assert_eq!(output.content, ToolResultOutput::text("Received: hi"));
    assert!(!output.is_error);
}

#[test]
fn test_edit_family_default_is_false() {
    assert!(!DummyTool.is_edit_tool());
}

#[test]
fn test_to_definition() {
    let def = DummyTool.to_definition();
    assert_eq!(def.name, "dummy");
    assert_eq!(def.description, "A dummy tool for testing");
    assert!(def.input_schema["required"].is_array());
}

#[test]
fn test_output_constructors() {
    let text = ToolOutput::text("hello");
    assert!(!text.is_error);

    let err = ToolOutput::error("boom");
    assert!(err.is_error);
    assert_eq!(err.content, ToolResultOutput::text("boom"));

    let json = ToolOutput::json(serde_json::json!({"k": 1}));
    assert!(matches!(json.content, ToolResultOutput::Json { .. }));
}
