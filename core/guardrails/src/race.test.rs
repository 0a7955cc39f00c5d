use super::*;
use crate::guardrail::FnGuardrail;
use crate::guardrail::GuardrailVerdict;
use std::time::Duration;

fn passing(name: &str) -> Arc<dyn Guardrail> {
    Arc::new(FnGuardrail::new(name, |_text, _cancel| async {
        Ok(GuardrailVerdict::pass())
    }))
}

fn blocking(name: &str, reason: &'static str) -> Arc<dyn Guardrail> {
    Arc::new(FnGuardrail::new(name, move |_text, _cancel| async move {
        Ok(GuardrailVerdict::block(reason))
    }))
}

#[tokio::test]
async fn test_empty_set_passes() {
    let cancel = CancellationToken::new();
    assert!(race_guardrails(&[], "text", &cancel, true).await.is_ok());
}

#[tokio::test]
async fn test_all_pass() {
    let cancel = CancellationToken::new();
    let guardrails = vec![passing("a"), passing("b")];
    assert!(
        race_guardrails(&guardrails, "text", &cancel, true)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_first_block_wins() {
    let cancel = CancellationToken::new();
    let guardrails = vec![passing("a"), blocking("b", "policy violation")];
    let err = race_guardrails(&guardrails, "text", &cancel, true)
        .await
        .unwrap_err();
    assert!(err.message.contains("policy violation"));
}

#[tokio::test]
async fn test_losers_are_cancelled() {
    let cancel = CancellationToken::new();

    // The slow guardrail observes the race token; a fast sibling blocks
    // immediately, so the slow one must see cancellation instead of running
    // to completion.
    let slow: Arc<dyn Guardrail> = Arc::new(FnGuardrail::new("slow", |_text, token| async move {
        tokio::select! {
            () = token.cancelled() => Ok(GuardrailVerdict::pass()),
            () = tokio::time::sleep(Duration::from_secs(30)) => {
                Ok(GuardrailVerdict::block("should never fire"))
            }
        }
    }));
    let guardrails = vec![blocking("fast", "fast block"), slow];

    let started = std::time::Instant::now();
    let err = race_guardrails(&guardrails, "text", &cancel, true)
        .await
        .unwrap_err();
    assert!(err.message.contains("fast block"));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_failing_guardrail_fail_open() {
    let cancel = CancellationToken::new();
    let failing: Arc<dyn Guardrail> = Arc::new(FnGuardrail::new("broken", |_text, _cancel| async {
        Err(tandem_error::AgentError::validation("guardrail crashed"))
    }));

    let guardrails = vec![failing.clone(), passing("ok")];
    assert!(
        race_guardrails(&guardrails, "text", &cancel, true)
            .await
            .is_ok()
    );

    // Fail-closed propagates the failure.
    let guardrails = vec![failing];
    assert!(
        race_guardrails(&guardrails, "text", &cancel, false)
            .await
            .is_err()
    );
}
