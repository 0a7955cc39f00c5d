use super::*;
use tandem_error::ErrorCode;

#[test]
fn test_interrupt_accessor() {
    let failure = ToolFailure::Interrupt(InterruptSignal {
        tool_call_id: "call_1".to_string(),
        tool_name: "ask".to_string(),
        request: serde_json::json!({"question": "which?"}),
        kind: InterruptKind::Custom,
    });
    let signal = failure.as_interrupt().unwrap();
    assert_eq!(signal.tool_call_id, "call_1");
    assert_eq!(signal.kind, InterruptKind::Custom);
}

#[test]
fn test_error_is_not_interrupt() {
    let failure = ToolFailure::Error(AgentError::tool("boom"));
    assert!(failure.as_interrupt().is_none());
}

#[test]
fn test_from_agent_error() {
    let failure: ToolFailure = AgentError::new(ErrorCode::Validation, "bad input").into();
    assert!(matches!(failure, ToolFailure::Error(_)));
}

#[test]
fn test_display() {
    let failure = ToolFailure::Interrupt(InterruptSignal {
        tool_call_id: "call_1".to_string(),
        tool_name: "ask".to_string(),
        request: serde_json::json!({}),
        kind: InterruptKind::Custom,
    });
    assert!(failure.to_string().contains("call_1"));
}

#[test]
fn test_signal_serde_round_trip() {
    let signal = InterruptSignal {
        tool_call_id: "call_2".to_string(),
        tool_name: "write".to_string(),
        request: serde_json::json!({"file_path": "/a"}),
        kind: InterruptKind::Approval,
    };
    let json = serde_json::to_string(&signal).unwrap();
    let parsed: InterruptSignal = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, signal);
}
