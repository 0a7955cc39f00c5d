use super::*;
use serde_json::json;

fn sample_interrupt() -> Interrupt {
    Interrupt::new(
        "t1",
        crate::InterruptKind::Approval,
        "call_1",
        "write",
        json!({}),
    )
}

#[test]
fn test_complete_accessors() {
    let result = TurnResult::Complete {
        text: "Hello, world!".to_string(),
        usage: TokenUsage::new(10, 5),
        finish_reason: FinishReason::Stop,
        steps: 1,
        forked_session_id: None,
    };
    assert_eq!(result.text(), Some("Hello, world!"));
    assert!(!result.is_interrupted());
    assert!(result.interrupt().is_none());
}

#[test]
fn test_interrupted_accessors() {
    let result = TurnResult::Interrupted {
        interrupt: sample_interrupt(),
        forked_session_id: Some("fork-1".to_string()),
    };
    assert!(result.is_interrupted());
    assert_eq!(result.interrupt().unwrap().id, "int_call_1");
    assert_eq!(result.forked_session_id(), Some("fork-1"));
}

#[test]
fn test_status_tag_on_wire() {
    let result = TurnResult::Interrupted {
        interrupt: sample_interrupt(),
        forked_session_id: None,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "interrupted");

    let result = TurnResult::Complete {
        text: String::new(),
        usage: TokenUsage::default(),
        finish_reason: FinishReason::Stop,
        steps: 0,
        forked_session_id: None,
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "complete");
}
