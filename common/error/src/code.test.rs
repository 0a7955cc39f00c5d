use super::*;
use strum::IntoEnumIterator;

#[test]
fn test_wire_codes() {
    assert_eq!(ErrorCode::Configuration.code(), "CONFIGURATION_ERROR");
    assert_eq!(ErrorCode::RateLimit.code(), "RATE_LIMIT_ERROR");
    assert_eq!(ErrorCode::Checkpoint.code(), "CHECKPOINT_ERROR");
    assert_eq!(ErrorCode::Agent.code(), "AGENT_ERROR");
    assert_eq!(ErrorCode::Unknown.code(), "UNKNOWN_ERROR");
}

#[test]
fn test_from_code_round_trips() {
    for code in ErrorCode::iter() {
        assert_eq!(ErrorCode::from_code(code.code()), Some(code));
    }
    assert_eq!(ErrorCode::from_code("NOT_A_CODE"), None);
}

#[test]
fn test_retryable_defaults() {
    assert!(ErrorCode::RateLimit.is_retryable());
    assert!(ErrorCode::Timeout.is_retryable());
    assert!(ErrorCode::Network.is_retryable());
    assert!(ErrorCode::Backend.is_retryable());
    assert!(!ErrorCode::Authentication.is_retryable());
    assert!(!ErrorCode::Validation.is_retryable());
    assert!(!ErrorCode::Checkpoint.is_retryable());
}

#[test]
fn test_rate_limit_default_delay() {
    assert_eq!(ErrorCode::RateLimit.retry_after_ms(), Some(30_000));
    assert_eq!(ErrorCode::Timeout.retry_after_ms(), None);
}

#[test]
fn test_severity_defaults() {
    assert_eq!(ErrorCode::Authentication.severity(), Severity::Fatal);
    assert_eq!(ErrorCode::Authorization.severity(), Severity::Fatal);
    assert_eq!(ErrorCode::Configuration.severity(), Severity::Fatal);
    assert_eq!(ErrorCode::Abort.severity(), Severity::Warning);
    assert_eq!(ErrorCode::Tool.severity(), Severity::Error);
}

#[test]
fn test_classify_rate_limit() {
    assert_eq!(
        ErrorCode::classify("rate limit exceeded"),
        ErrorCode::RateLimit
    );
    assert_eq!(ErrorCode::classify("429 Too Many Requests"), ErrorCode::RateLimit);
    assert_eq!(ErrorCode::classify("server overloaded"), ErrorCode::RateLimit);
}

#[test]
fn test_classify_timeout() {
    assert_eq!(ErrorCode::classify("request timed out"), ErrorCode::Timeout);
    assert_eq!(ErrorCode::classify("Timeout waiting for stream"), ErrorCode::Timeout);
}

#[test]
fn test_classify_auth() {
    assert_eq!(ErrorCode::classify("401 Unauthorized"), ErrorCode::Authentication);
    assert_eq!(ErrorCode::classify("invalid api key"), ErrorCode::Authentication);
    assert_eq!(ErrorCode::classify("403 Forbidden"), ErrorCode::Authorization);
}

#[test]
fn test_classify_backend_and_network() {
    assert_eq!(ErrorCode::classify("503 Service Unavailable"), ErrorCode::Backend);
    assert_eq!(ErrorCode::classify("internal server error"), ErrorCode::Backend);
    assert_eq!(ErrorCode::classify("connection refused"), ErrorCode::Network);
    assert_eq!(ErrorCode::classify("dns lookup failed"), ErrorCode::Network);
}

#[test]
fn test_classify_unknown() {
    assert_eq!(ErrorCode::classify("something odd happened"), ErrorCode::Unknown);
}

#[test]
fn test_transient_set() {
    assert!(ErrorCode::RateLimit.is_transient());
    assert!(ErrorCode::Timeout.is_transient());
    assert!(ErrorCode::Network.is_transient());
    assert!(ErrorCode::Backend.is_transient());
    assert!(!ErrorCode::Authentication.is_transient());
    assert!(!ErrorCode::Validation.is_transient());
    assert!(!ErrorCode::Model.is_transient());
}

#[test]
fn test_serde_round_trip() {
    let json = serde_json::to_string(&ErrorCode::RateLimit).unwrap();
    assert_eq!(json, "\"RATE_LIMIT_ERROR\"");
    let parsed: ErrorCode = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, ErrorCode::RateLimit);
}

#[test]
fn test_user_messages_have_no_internals() {
    for code in ErrorCode::iter() {
        let msg = code.user_message();
        assert!(!msg.is_empty());
        assert!(!msg.contains("stack"));
    }
}
