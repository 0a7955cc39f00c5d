use super::*;
use serde_json::json;

fn ctx_with_responses(responses: InterruptResponses) -> ToolContext {
    ToolContext::new(
        "call_1",
        "ask",
        Arc::new(Mutex::new(ConversationState::new())),
        responses,
    )
}

#[test]
fn test_interrupt_raises_signal_without_response() {
    let ctx = ctx_with_responses(InterruptResponses::new());
    let failure = ctx.interrupt(json!({"question": "pick one"})).unwrap_err();
    let signal = failure.as_interrupt().unwrap();
    assert_eq!(signal.tool_call_id, "call_1");
    assert_eq!(signal.tool_name, "ask");
    assert_eq!(signal.kind, InterruptKind::Custom);
    assert_eq!(signal.request, json!({"question": "pick one"}));
}

#[test]
fn test_interrupt_consumes_bound_response_once() {
    let responses = InterruptResponses::new();
    responses.bind("call_1", json!({"answer": 42}));

    let ctx = ctx_with_responses(responses);
    let first = ctx.interrupt(json!({})).unwrap();
    assert_eq!(first, json!({"answer": 42}));

    // Second call raises a fresh signal.
    assert!(ctx.interrupt(json!({})).is_err());
}

#[test]
fn test_responses_keyed_by_raw_call_id() {
    let responses = InterruptResponses::new();
    // Bound under the interrupt id rather than the raw call id: not visible.
    responses.bind("int_call_1", json!(true));

    let ctx = ctx_with_responses(responses);
    assert!(ctx.interrupt(json!({})).is_err());
}

#[test]
fn test_with_state_mutates_shared_state() {
    let state = Arc::new(Mutex::new(ConversationState::new()));
    let ctx = ToolContext::new("c", "write", state.clone(), InterruptResponses::new());

    ctx.with_state(|s| s.write_file("/a.txt", "content"));

    let state = state.lock().unwrap();
    assert!(state.files.contains_key("/a.txt"));
}

#[test]
fn test_builder_chain() {
    let ctx = ctx_with_responses(InterruptResponses::new()).with_thread_id("t1");
    assert_eq!(ctx.thread_id.as_deref(), Some("t1"));
}
