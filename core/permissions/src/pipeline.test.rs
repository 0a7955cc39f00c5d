use super::*;
use serde_json::json;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_hooks::FnHook;
use tandem_hooks::HookOutput;

fn effective() -> Vec<String> {
    vec!["write".to_string(), "edit".to_string(), "bash".to_string()]
}

fn pipeline(
    mode: PermissionMode,
    callback: Option<Arc<dyn CanUseTool>>,
) -> PermissionPipeline {
    PermissionPipeline::new(mode, callback, Arc::new(HookRegistry::new()))
}

async fn evaluate(pipeline: &PermissionPipeline, tool: &str, is_edit: bool) -> GateDecision {
    pipeline
        .evaluate(
            tool,
            &json!({"file_path": "/t.txt", "content": "x"}),
            "call_1",
            is_edit,
            &effective(),
            None,
            &CancellationToken::new(),
        )
        .await
}

#[test]
fn test_filter_tools_intersection_and_subtraction() {
    let registered = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let filtered = filter_tools(&registered, Some(&["a".to_string(), "b".to_string()]), &[]);
    assert_eq!(filtered, vec!["a", "b"]);

    // disallowed always wins over allowed.
    let filtered = filter_tools(
        &registered,
        Some(&["a".to_string(), "b".to_string()]),
        &["b".to_string()],
    );
    assert_eq!(filtered, vec!["a"]);

    // no allow-list: everything registered minus disallowed.
    let filtered = filter_tools(&registered, None, &["c".to_string()]);
    assert_eq!(filtered, vec!["a", "b"]);
}

#[tokio::test]
async fn test_unregistered_tool_denied() {
    let pipeline = pipeline(PermissionMode::Default, None);
    let decision = evaluate(&pipeline, "ghost", false).await;
    match decision {
        GateDecision::Deny(err) => {
            assert_eq!(err.code, tandem_error::ErrorCode::Tool);
            assert!(err.message.contains("not available"));
        }
        _ => panic!("expected deny"),
    }
}

#[tokio::test]
async fn test_plan_mode_blocks_everything() {
    let callback_calls = Arc::new(AtomicUsize::new(0));
    let calls = callback_calls.clone();
    let callback: Arc<dyn CanUseTool> = Arc::new(FnCanUseTool::new(move |_, _| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            PermissionBehavior::Allow
        }
    }));

    let pipeline = pipeline(PermissionMode::Plan, Some(callback));
    let decision = evaluate(&pipeline, "write", true).await;
    match decision {
        GateDecision::Deny(err) => {
            assert!(err.message.contains("blocked in plan mode"));
            assert_eq!(
                err.metadata_value("permissionMode").and_then(|v| v.as_str()),
                Some("plan")
            );
            assert_eq!(
                err.metadata_value("toolName").and_then(|v| v.as_str()),
                Some("write")
            );
        }
        _ => panic!("expected deny"),
    }
    // Plan mode rejects before the callback stage.
    assert_eq!(callback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_bypass_skips_callback() {
    let callback_calls = Arc::new(AtomicUsize::new(0));
    let calls = callback_calls.clone();
    let callback: Arc<dyn CanUseTool> = Arc::new(FnCanUseTool::new(move |_, _| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            PermissionBehavior::Deny
        }
    }));

    let pipeline = pipeline(PermissionMode::BypassPermissions, Some(callback));
    assert!(evaluate(&pipeline, "bash", false).await.is_allow());
    assert_eq!(callback_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_accept_edits_auto_allows_edit_family_only() {
    let callback: Arc<dyn CanUseTool> =
        Arc::new(FnCanUseTool::new(|_, _| async { PermissionBehavior::Deny }));
    let pipeline = pipeline(PermissionMode::AcceptEdits, Some(callback));

    // Edit-family tool skips stages 3-4.
    assert!(evaluate(&pipeline, "write", true).await.is_allow());

    // Non-edit tool falls through to the denying callback.
    match evaluate(&pipeline, "bash", false).await {
        GateDecision::Deny(err) => {
            assert!(err.message.contains("denied by canUseTool callback"));
        }
        _ => panic!("expected deny"),
    }
}

#[tokio::test]
async fn test_callback_ask_needs_approval() {
    let callback: Arc<dyn CanUseTool> =
        Arc::new(FnCanUseTool::new(|_, _| async { PermissionBehavior::Ask }));
    let pipeline = pipeline(PermissionMode::Default, Some(callback));

    match evaluate(&pipeline, "write", true).await {
        GateDecision::NeedsApproval { reason } => {
            assert_eq!(reason, "requires user approval");
        }
        _ => panic!("expected approval request"),
    }
}

#[tokio::test]
async fn test_pre_tool_use_hook_blocks() {
    let hooks = Arc::new(HookRegistry::new());
    hooks.register(
        HookEvent::PreToolUse,
        Arc::new(FnHook::new("no-bash", |ctx| async move {
            if ctx.tool_name.as_deref() == Some("bash") {
                Ok(HookOutput::Block {
                    reason: "shell disabled".to_string(),
                })
            } else {
                Ok(HookOutput::Continue)
            }
        })),
    );
    let pipeline = PermissionPipeline::new(PermissionMode::Default, None, hooks);

    match evaluate(&pipeline, "bash", false).await {
        GateDecision::Deny(err) => assert!(err.message.contains("shell disabled")),
        _ => panic!("expected deny"),
    }
    assert!(evaluate(&pipeline, "write", true).await.is_allow());
}

#[tokio::test]
async fn test_default_mode_without_callback_allows() {
    let pipeline = pipeline(PermissionMode::Default, None);
    assert!(evaluate(&pipeline, "write", true).await.is_allow());
}

#[tokio::test]
async fn test_set_mode() {
    let mut pipeline = pipeline(PermissionMode::Default, None);
    assert!(evaluate(&pipeline, "write", true).await.is_allow());

    pipeline.set_mode(PermissionMode::Plan);
    assert!(matches!(
        evaluate(&pipeline, "write", true).await,
        GateDecision::Deny(_)
    ));
}
