use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_role_serde() {
    assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
    let parsed: Role = serde_json::from_str("\"tool\"").unwrap();
    assert_eq!(parsed, Role::Tool);
}

#[test]
fn test_tool_result_output_wire_shape() {
    let text = ToolResultOutput::text("done");
    let json = serde_json::to_value(&text).unwrap();
    assert_eq!(json, json!({"type": "text", "value": "done"}));

    let structured = ToolResultOutput::json(json!({"ok": true}));
    let json = serde_json::to_value(&structured).unwrap();
    assert_eq!(json, json!({"type": "json", "value": {"ok": true}}));
}

#[test]
fn test_content_part_tagging() {
    let part = ContentPart::ToolCall {
        id: "call_1".to_string(),
        name: "write".to_string(),
        args: json!({"file_path": "/a"}),
    };
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json["type"], "tool-call");
    assert_eq!(json["id"], "call_1");

    let part = ContentPart::Reasoning {
        id: "r1".to_string(),
        text: "thinking".to_string(),
    };
    let json = serde_json::to_value(&part).unwrap();
    assert_eq!(json["type"], "reasoning");
}

#[test]
fn test_message_content_untagged() {
    let msg = Message::user("hello");
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["content"], "hello");

    let parsed: Message = serde_json::from_value(json!({
        "role": "assistant",
        "content": [{"type": "text", "text": "hi"}]
    }))
    .unwrap();
    assert_eq!(parsed.text(), "hi");
}

#[test]
fn test_message_text_concatenates_parts() {
    let msg = Message::assistant_parts(vec![
        ContentPart::Text {
            text: "Hello".to_string(),
        },
        ContentPart::ToolCall {
            id: "c1".to_string(),
            name: "write".to_string(),
            args: json!({}),
        },
        ContentPart::Text {
            text: ", world".to_string(),
        },
    ]);
    assert_eq!(msg.text(), "Hello, world");
    assert_eq!(msg.tool_calls().len(), 1);
}

#[test]
fn test_validate_conversation_accepts_valid() {
    let messages = vec![
        Message::system("sys"),
        Message::user("hi"),
        Message::assistant_parts(vec![ContentPart::ToolCall {
            id: "call_1".to_string(),
            name: "write".to_string(),
            args: json!({}),
        }]),
        Message::tool_results(vec![ContentPart::ToolResult {
            id: "call_1".to_string(),
            name: "write".to_string(),
            output: ToolResultOutput::text("ok"),
        }]),
    ];
    assert!(validate_conversation(&messages).is_ok());
}

#[test]
fn test_validate_conversation_rejects_orphan_result() {
    let messages = vec![Message::tool_results(vec![ContentPart::ToolResult {
        id: "call_9".to_string(),
        name: "write".to_string(),
        output: ToolResultOutput::text("ok"),
    }])];
    let err = validate_conversation(&messages).unwrap_err();
    assert!(err.contains("call_9"));
}

#[test]
fn test_validate_conversation_rejects_misplaced_system() {
    let messages = vec![Message::user("hi"), Message::system("sys")];
    assert!(validate_conversation(&messages).is_err());
}

#[test]
fn test_char_len_covers_all_parts() {
    let content = MessageContent::Parts(vec![
        ContentPart::Text {
            text: "abcd".to_string(),
        },
        ContentPart::Reasoning {
            id: "r".to_string(),
            text: "ef".to_string(),
        },
    ]);
    assert_eq!(content.char_len(), 6);
}
