use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_chunk_type_tags() {
    let chunk = StreamChunk::TextDelta {
        text: "hi".to_string(),
    };
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json["type"], "text-delta");

    let chunk = StreamChunk::ToolCall {
        tool_call_id: "c1".to_string(),
        tool_name: "write".to_string(),
        input: json!({}),
    };
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json["type"], "tool-call");

    let chunk = StreamChunk::Finish {
        finish_reason: FinishReason::Stop,
        total_usage: TokenUsage::new(10, 5),
    };
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json["type"], "finish");
    assert_eq!(json["finish_reason"], "stop");
}

#[test]
fn test_reasoning_delta_legacy_field_normalised() {
    // Upstream drivers may emit the legacy `delta` field name.
    let parsed: StreamChunk = serde_json::from_value(json!({
        "type": "reasoning-delta",
        "id": "r1",
        "delta": "thinking..."
    }))
    .unwrap();
    assert_eq!(
        parsed,
        StreamChunk::ReasoningDelta {
            id: "r1".to_string(),
            text: "thinking...".to_string(),
        }
    );
}

#[test]
fn test_reasoning_delta_modern_field() {
    let parsed: StreamChunk = serde_json::from_value(json!({
        "type": "reasoning-delta",
        "id": "r1",
        "text": "thinking..."
    }))
    .unwrap();
    assert!(matches!(parsed, StreamChunk::ReasoningDelta { text, .. } if text == "thinking..."));
}

#[test]
fn test_usage_accumulation() {
    let mut usage = TokenUsage::new(10, 5);
    usage.add(TokenUsage::new(3, 2));
    assert_eq!(usage.input_tokens, 13);
    assert_eq!(usage.output_tokens, 7);
    assert_eq!(usage.total(), 20);
}

#[test]
fn test_finish_reason_serde() {
    assert_eq!(
        serde_json::to_string(&FinishReason::ToolCalls).unwrap(),
        "\"tool-calls\""
    );
}
