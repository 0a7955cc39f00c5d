use super::*;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_error::AgentError;

#[tokio::test]
async fn test_hooks_fire_in_registration_order() {
    let registry = HookRegistry::new();
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = order.clone();
        registry.register(
            HookEvent::PreGenerate,
            Arc::new(FnHook::new(label, move |_ctx| {
                let order = order.clone();
                async move {
                    order.lock().unwrap_or_else(|e| e.into_inner()).push(label);
                    Ok(HookOutput::Continue)
                }
            })),
        );
    }

    let ctx = HookContext::new(HookEvent::PreGenerate);
    let outputs = registry.run(&ctx).await.unwrap();
    assert_eq!(outputs.len(), 3);
    assert_eq!(
        *order.lock().unwrap_or_else(|e| e.into_inner()),
        vec!["first", "second", "third"]
    );
}

#[tokio::test]
async fn test_events_are_isolated() {
    let registry = HookRegistry::new();
    registry.register(
        HookEvent::PreToolUse,
        Arc::new(FnHook::new("gate", |_ctx| async {
            Ok(HookOutput::Block {
                reason: "no".to_string(),
            })
        })),
    );

    assert!(registry.has_hooks(HookEvent::PreToolUse));
    assert!(!registry.has_hooks(HookEvent::PostToolUse));

    let ctx = HookContext::new(HookEvent::PostToolUse);
    let outputs = registry.run(&ctx).await.unwrap();
    assert!(outputs.is_empty());
}

#[tokio::test]
async fn test_run_propagates_errors() {
    let registry = HookRegistry::new();
    registry.register(
        HookEvent::PreGenerate,
        Arc::new(FnHook::new("boom", |_ctx| async {
            Err(AgentError::validation("hook exploded"))
        })),
    );

    let ctx = HookContext::new(HookEvent::PreGenerate);
    assert!(registry.run(&ctx).await.is_err());
}

#[tokio::test]
async fn test_run_logged_swallows_errors() {
    let registry = HookRegistry::new();
    let after = Arc::new(AtomicUsize::new(0));

    registry.register(
        HookEvent::PostGenerate,
        Arc::new(FnHook::new("boom", |_ctx| async {
            Err(AgentError::validation("hook exploded"))
        })),
    );
    let after_clone = after.clone();
    registry.register(
        HookEvent::PostGenerate,
        Arc::new(FnHook::new("observer", move |_ctx| {
            let after = after_clone.clone();
            async move {
                after.fetch_add(1, Ordering::SeqCst);
                Ok(HookOutput::Continue)
            }
        })),
    );

    let ctx = HookContext::new(HookEvent::PostGenerate);
    let outputs = registry.run_logged(&ctx).await;
    // The failing hook is dropped; the later hook still runs.
    assert_eq!(outputs.len(), 1);
    assert_eq!(after.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_context_reaches_hook() {
    let registry = HookRegistry::new();
    registry.register(
        HookEvent::PreToolUse,
        Arc::new(FnHook::new("inspector", |ctx| async move {
            if ctx.tool_name.as_deref() == Some("write") {
                Ok(HookOutput::Block {
                    reason: "writes blocked".to_string(),
                })
            } else {
                Ok(HookOutput::Continue)
            }
        })),
    );

    let ctx = HookContext::new(HookEvent::PreToolUse).with_tool(
        "call_1",
        "write",
        serde_json::json!({}),
    );
    let outputs = registry.run(&ctx).await.unwrap();
    assert!(outputs[0].is_block());
}
