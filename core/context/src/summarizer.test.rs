use super::*;
use tandem_protocol::ToolResultOutput;

fn tool_result_message(name: &str, value: &str) -> Message {
    Message::tool_results(vec![ContentPart::ToolResult {
        id: format!("call_{name}"),
        name: name.to_string(),
        output: ToolResultOutput::text(value),
    }])
}

#[test]
fn test_prompt_contains_roles_and_text() {
    let messages = vec![Message::user("find the bug"), Message::assistant("found it")];
    let prompt = build_summary_prompt(&messages, 3);
    assert!(prompt.contains("[user] find the bug"));
    assert!(prompt.contains("[assistant] found it"));
    assert!(prompt.contains("Summarize the following conversation"));
}

#[test]
fn test_old_tool_results_elided() {
    let messages = vec![
        tool_result_message("first", "old output"),
        tool_result_message("second", "mid output"),
        tool_result_message("third", "recent output"),
    ];

    let prompt = build_summary_prompt(&messages, 1);
    assert!(prompt.contains("<tool-result first: elided>"));
    assert!(prompt.contains("<tool-result second: elided>"));
    assert!(prompt.contains("<tool-result third: recent output>"));
}

#[test]
fn test_all_tool_results_kept_when_under_limit() {
    let messages = vec![tool_result_message("only", "output")];
    let prompt = build_summary_prompt(&messages, 3);
    assert!(prompt.contains("<tool-result only: output>"));
    assert!(!prompt.contains("elided"));
}

#[test]
fn test_tool_calls_rendered() {
    let messages = vec![Message::assistant_parts(vec![ContentPart::ToolCall {
        id: "c1".to_string(),
        name: "write".to_string(),
        args: serde_json::json!({"file_path": "/a"}),
    }])];
    let prompt = build_summary_prompt(&messages, 3);
    assert!(prompt.contains("<tool-call write:"));
}
