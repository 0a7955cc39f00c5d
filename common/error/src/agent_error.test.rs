use super::*;
use std::error::Error as _;

#[test]
fn test_new_inherits_code_defaults() {
    let err = AgentError::new(ErrorCode::RateLimit, "too many requests");
    assert_eq!(err.code, ErrorCode::RateLimit);
    assert!(err.is_retryable());
    assert_eq!(err.retry_after_ms(), Some(30_000));
    assert_eq!(err.severity(), Severity::Error);
}

#[test]
fn test_display_includes_code_and_message() {
    let err = AgentError::tool("write failed");
    assert_eq!(err.to_string(), "TOOL_ERROR: write failed");
}

#[test]
fn test_overrides() {
    let err = AgentError::new(ErrorCode::Checkpoint, "save failed").with_retryable(true);
    assert!(err.is_retryable());

    let err = AgentError::new(ErrorCode::Checkpoint, "load failed");
    assert!(!err.is_retryable());
}

#[test]
fn test_metadata() {
    let err = AgentError::tool("denied")
        .with_metadata("toolName", "write")
        .with_thread_id("thread-1");
    assert_eq!(
        err.metadata_value("toolName").and_then(|v| v.as_str()),
        Some("write")
    );
    assert_eq!(
        err.metadata_value("threadId").and_then(|v| v.as_str()),
        Some("thread-1")
    );
}

#[test]
fn test_cause_chain_preserved() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = wrap_error_with_code(io, ErrorCode::Checkpoint, Some("load failed"));
    assert_eq!(err.code, ErrorCode::Checkpoint);
    assert_eq!(err.message, "load failed");
    let source = err.source().expect("cause preserved");
    assert!(source.to_string().contains("file not found"));
}

#[test]
fn test_wrap_error_infers_rate_limit() {
    let cause = std::io::Error::other("rate limit exceeded");
    let err = wrap_error(cause, None);
    assert_eq!(err.code, ErrorCode::RateLimit);
    assert!(err.is_retryable());
}

#[test]
fn test_wrap_error_infers_timeout() {
    let cause = std::io::Error::other("request timed out after 30s");
    let err = wrap_error(cause, Some("model call failed"));
    assert_eq!(err.code, ErrorCode::Timeout);
    assert_eq!(err.message, "model call failed");
}

#[test]
fn test_wrap_error_infers_auth() {
    let cause = std::io::Error::other("401 unauthorized");
    let err = wrap_error(cause, None);
    assert_eq!(err.code, ErrorCode::Authentication);
    assert!(!err.is_retryable());
    assert_eq!(err.severity(), Severity::Fatal);
}

#[test]
fn test_wrap_error_infers_backend() {
    let cause = std::io::Error::other("503 service unavailable");
    let err = wrap_error(cause, None);
    assert_eq!(err.code, ErrorCode::Backend);
}

#[test]
fn test_user_message_hides_internals() {
    let err = AgentError::new(ErrorCode::Model, "panic in decoder at line 42");
    assert_eq!(err.user_message(), "The model returned an error.");
}

#[test]
fn test_get_user_message_fallback() {
    let agent_err = AgentError::new(ErrorCode::RateLimit, "429");
    let err_ref: &(dyn std::error::Error + 'static) = &agent_err;
    assert_eq!(
        get_user_message(err_ref, "fallback"),
        "Rate limit reached. Please retry shortly."
    );

    let io = std::io::Error::other("boom");
    let err_ref: &(dyn std::error::Error + 'static) = &io;
    assert_eq!(get_user_message(err_ref, "fallback"), "fallback");
}

#[test]
fn test_io_error_from() {
    let io = std::io::Error::other("connection reset");
    let err: AgentError = io.into();
    assert_eq!(err.code, ErrorCode::Network);
}
