use super::*;
use serde_json::json;

#[test]
fn test_builder_chain() {
    let ctx = HookContext::new(HookEvent::PreToolUse)
        .with_thread_id("t1")
        .with_tool("call_1", "write", json!({"file_path": "/a"}))
        .with_metadata("permissionMode", json!("plan"));

    assert_eq!(ctx.event, HookEvent::PreToolUse);
    assert_eq!(ctx.thread_id.as_deref(), Some("t1"));
    assert_eq!(ctx.tool_use_id.as_deref(), Some("call_1"));
    assert_eq!(ctx.tool_name.as_deref(), Some("write"));
    assert_eq!(ctx.metadata.get("permissionMode"), Some(&json!("plan")));
}

#[test]
fn test_defaults_are_empty() {
    let ctx = HookContext::new(HookEvent::PostGenerate);
    assert!(ctx.thread_id.is_none());
    assert!(ctx.tool_name.is_none());
    assert!(ctx.metadata.is_empty());
    assert!(!ctx.cancel.is_cancelled());
}
