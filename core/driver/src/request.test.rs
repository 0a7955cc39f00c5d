use super::*;
use serde_json::json;

#[test]
fn test_request_builder() {
    let request = GenerateRequest::new(vec![Message::user("hi")])
        .with_tools(vec![ToolDefinition::new("write", "Write a file", json!({}))])
        .with_max_tokens(1024);
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.max_tokens, Some(1024));
}

#[test]
fn test_response_text_extraction() {
    let response = GenerateResponse {
        content: vec![
            ContentPart::Text {
                text: "Hello".to_string(),
            },
            ContentPart::ToolCall {
                id: "c1".to_string(),
                name: "write".to_string(),
                args: json!({}),
            },
            ContentPart::Text {
                text: " world".to_string(),
            },
        ],
        usage: TokenUsage::new(5, 3),
        finish_reason: FinishReason::ToolCalls,
    };
    assert_eq!(response.text(), "Hello world");
    assert!(response.has_tool_calls());
    assert_eq!(response.tool_calls().len(), 1);
    assert_eq!(response.tool_calls()[0].1, "write");
}

#[test]
fn test_text_response_constructor() {
    let response = GenerateResponse::text_response("done", TokenUsage::new(1, 2));
    assert_eq!(response.text(), "done");
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert!(!response.has_tool_calls());
}
