use super::*;
use serde_json::json;

#[test]
fn test_interrupt_id_format() {
    assert_eq!(interrupt_id("call_1"), "int_call_1");
}

#[test]
fn test_interrupt_new_derives_id() {
    let interrupt = Interrupt::new(
        "thread-1",
        InterruptKind::Approval,
        "call_7",
        "write",
        json!({"file_path": "/a"}),
    );
    assert_eq!(interrupt.id, "int_call_7");
    assert_eq!(interrupt.thread_id, "thread-1");
    assert_eq!(interrupt.kind, InterruptKind::Approval);
    assert_eq!(interrupt.tool_call_id, "call_7");
}

#[test]
fn test_checkpoint_new_is_empty() {
    let checkpoint = Checkpoint::new("t1");
    assert_eq!(checkpoint.step, 0);
    assert!(checkpoint.messages.is_empty());
    assert!(checkpoint.pending_interrupt.is_none());
}

#[test]
fn test_fork_copies_messages_and_state() {
    let mut source = Checkpoint::new("t1");
    source.messages.push(crate::Message::user("hello"));
    source.state.write_file("/a.txt", "content");
    source.step = 5;
    source.pending_interrupt = Some(Interrupt::new(
        "t1",
        InterruptKind::Custom,
        "call_1",
        "ask",
        json!({}),
    ));

    let fork = source.fork_to("t2");
    assert_eq!(fork.thread_id, "t2");
    assert_eq!(fork.step, 0);
    assert_eq!(fork.messages, source.messages);
    assert_eq!(fork.state, source.state);
    assert!(fork.pending_interrupt.is_none());
}

#[test]
fn test_checkpoint_serde_round_trip() {
    let mut checkpoint = Checkpoint::new("t1");
    checkpoint.messages.push(crate::Message::user("hi"));
    checkpoint.pending_interrupt = Some(Interrupt::new(
        "t1",
        InterruptKind::Approval,
        "call_1",
        "write",
        json!({"k": "v"}),
    ));

    let json = serde_json::to_string(&checkpoint).unwrap();
    let parsed: Checkpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, checkpoint);
}
