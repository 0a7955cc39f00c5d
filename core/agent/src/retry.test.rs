use super::*;
use crate::testing::ScriptStep;
use crate::testing::ScriptedDriver;
use tandem_driver::GenerateRequest;
use tandem_error::ErrorCode;
use tandem_hooks::FnHook;
use tandem_protocol::Message;

fn request() -> GenerateRequest {
    GenerateRequest::new(vec![Message::user("hi")])
}

async fn run_generate(
    controller: &mut RetryController,
    request: GenerateRequest,
) -> Result<tandem_driver::GenerateResponse> {
    controller
        .run(|driver| {
            let request = request.clone();
            async move { driver.generate(request).await }
        })
        .await
}

#[tokio::test]
async fn test_success_passes_through() {
    let primary = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("hi")]));
    let mut controller = RetryController::new(
        primary.clone(),
        None,
        Arc::new(HookRegistry::new()),
        None,
        DEFAULT_MAX_RETRIES,
    );

    let response = run_generate(&mut controller, request()).await.unwrap();
    assert_eq!(response.text(), "hi");
    assert!(!controller.used_fallback());
}

#[tokio::test]
async fn test_fallback_on_rate_limit() {
    let primary = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("rate limit exceeded")],
    ));
    let fallback = Arc::new(ScriptedDriver::new(
        "fallback",
        vec![ScriptStep::Text("Fallback response")],
    ));
    let mut controller = RetryController::new(
        primary.clone(),
        Some(fallback.clone()),
        Arc::new(HookRegistry::new()),
        None,
        DEFAULT_MAX_RETRIES,
    );

    let response = run_generate(&mut controller, request()).await.unwrap();
    assert_eq!(response.text(), "Fallback response");
    assert!(controller.used_fallback());
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn test_fallback_used_at_most_once() {
    let primary = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("rate limit exceeded")],
    ));
    let fallback = Arc::new(ScriptedDriver::new(
        "fallback",
        vec![ScriptStep::Fail("rate limit exceeded")],
    ));
    let mut controller = RetryController::new(
        primary.clone(),
        Some(fallback.clone()),
        Arc::new(HookRegistry::new()),
        None,
        DEFAULT_MAX_RETRIES,
    );

    let err = run_generate(&mut controller, request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RateLimit);
    // Exactly two total calls: primary, then the fallback, then surface.
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
}

#[tokio::test]
async fn test_non_retryable_never_falls_back() {
    let primary = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("401 unauthorized")],
    ));
    let fallback = Arc::new(ScriptedDriver::new("fallback", vec![ScriptStep::Text("no")]));
    let mut controller = RetryController::new(
        primary.clone(),
        Some(fallback.clone()),
        Arc::new(HookRegistry::new()),
        None,
        DEFAULT_MAX_RETRIES,
    );

    let err = run_generate(&mut controller, request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Authentication);
    // The model is called exactly once even with a fallback configured.
    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 0);
}

#[tokio::test]
async fn test_hook_directed_retry() {
    let primary = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("503 service unavailable"), ScriptStep::Text("recovered")],
    ));
    let hooks = Arc::new(HookRegistry::new());
    hooks.register(
        HookEvent::PostGenerateFailure,
        Arc::new(FnHook::new("retry-once", |_ctx| async {
            Ok(HookOutput::Retry { retry_delay_ms: 0 })
        })),
    );
    let mut controller =
        RetryController::new(primary.clone(), None, hooks, None, DEFAULT_MAX_RETRIES);

    let response = run_generate(&mut controller, request()).await.unwrap();
    assert_eq!(response.text(), "recovered");
    assert_eq!(primary.call_count(), 2);
}

#[tokio::test]
async fn test_hook_retry_bounded_by_max_retries() {
    let steps: Vec<ScriptStep> = (0..20).map(|_| ScriptStep::Fail("503 service unavailable")).collect();
    let primary = Arc::new(ScriptedDriver::new("primary", steps));
    let hooks = Arc::new(HookRegistry::new());
    hooks.register(
        HookEvent::PostGenerateFailure,
        Arc::new(FnHook::new("retry-forever", |_ctx| async {
            Ok(HookOutput::Retry { retry_delay_ms: 0 })
        })),
    );
    let mut controller = RetryController::new(primary.clone(), None, hooks, None, 3);

    let err = run_generate(&mut controller, request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::Backend);
    // Initial attempt plus three retries.
    assert_eq!(primary.call_count(), 4);
}

#[tokio::test]
async fn test_errors_tagged_with_thread_id() {
    let primary = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("network down")],
    ));
    let mut controller = RetryController::new(
        primary,
        None,
        Arc::new(HookRegistry::new()),
        Some("t1".to_string()),
        DEFAULT_MAX_RETRIES,
    );

    let err = run_generate(&mut controller, request()).await.unwrap_err();
    assert_eq!(
        err.metadata_value("threadId").and_then(|v| v.as_str()),
        Some("t1")
    );
}

#[test]
fn test_should_use_fallback_set() {
    assert!(RetryController::should_use_fallback(&AgentError::new(
        ErrorCode::RateLimit,
        "429"
    )));
    assert!(RetryController::should_use_fallback(&AgentError::new(
        ErrorCode::Timeout,
        "slow"
    )));
    assert!(RetryController::should_use_fallback(&AgentError::new(
        ErrorCode::Backend,
        "503"
    )));
    assert!(!RetryController::should_use_fallback(&AgentError::new(
        ErrorCode::Authentication,
        "401"
    )));
    assert!(!RetryController::should_use_fallback(&AgentError::new(
        ErrorCode::Validation,
        "bad"
    )));
}
