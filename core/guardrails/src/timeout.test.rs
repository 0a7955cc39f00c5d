use super::*;
use crate::guardrail::FnGuardrail;

fn slow_guardrail() -> Arc<dyn Guardrail> {
    Arc::new(FnGuardrail::new("slow", |_text, _cancel| async {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(GuardrailVerdict::block("too late"))
    }))
}

#[tokio::test]
async fn test_timeout_fails_open_by_default() {
    let wrapped = TimeoutGuardrail::new(slow_guardrail(), Duration::from_millis(10));
    let verdict = wrapped
        .check("text", &CancellationToken::new())
        .await
        .unwrap();
    assert!(!verdict.blocked);
}

#[tokio::test]
async fn test_timeout_fail_closed_blocks() {
    let wrapped = TimeoutGuardrail::new(slow_guardrail(), Duration::from_millis(10)).fail_closed();
    let verdict = wrapped
        .check("text", &CancellationToken::new())
        .await
        .unwrap();
    assert!(verdict.blocked);
    assert_eq!(verdict.reason.as_deref(), Some("Guardrail check timed out"));
}

#[tokio::test]
async fn test_fast_guardrail_unaffected() {
    let fast: Arc<dyn Guardrail> = Arc::new(FnGuardrail::new("fast", |_text, _cancel| async {
        Ok(GuardrailVerdict::block("real verdict"))
    }));
    let wrapped = TimeoutGuardrail::new(fast, Duration::from_secs(5));
    let verdict = wrapped
        .check("text", &CancellationToken::new())
        .await
        .unwrap();
    assert!(verdict.blocked);
    assert_eq!(verdict.reason.as_deref(), Some("real verdict"));
}
