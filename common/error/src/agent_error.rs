//! The `AgentError` type: code + message + metadata + preserved cause chain.

use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::code::ErrorCode;
use crate::code::Severity;

/// Result type alias used across the runtime.
pub type Result<T> = std::result::Result<T, AgentError>;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Every failure surfaced from the runtime.
///
/// Carries a classification code, a developer-facing message, structured
/// metadata, and an optional cause. Severity, retryability and the retry
/// delay default from the code but can be overridden per error (checkpoint
/// `save` failures, for example, are retryable while `load` failures are not,
/// under the same code).
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct AgentError {
    /// Classification code.
    pub code: ErrorCode,

    /// Developer-facing message.
    pub message: String,

    severity: Severity,
    retryable: bool,
    retry_after_ms: Option<u64>,

    /// Structured metadata (tool name, thread id, operation, ...).
    pub metadata: Map<String, Value>,

    #[source]
    source: Option<BoxedError>,
}

impl AgentError {
    /// Create an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: code.severity(),
            retryable: code.is_retryable(),
            retry_after_ms: code.retry_after_ms(),
            metadata: Map::new(),
            source: None,
        }
    }

    /// Shorthand for a `CONFIGURATION_ERROR`.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    /// Shorthand for a `VALIDATION_ERROR`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Shorthand for a `TOOL_ERROR`.
    pub fn tool(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Tool, message)
    }

    /// Shorthand for an `ABORT_ERROR`.
    pub fn abort(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Abort, message)
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach the thread id this error occurred on.
    pub fn with_thread_id(self, thread_id: impl Into<String>) -> Self {
        self.with_metadata("threadId", thread_id.into())
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Override retryability (the code's default otherwise).
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Override severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Override the retry delay hint.
    pub fn with_retry_after_ms(mut self, delay_ms: u64) -> Self {
        self.retry_after_ms = Some(delay_ms);
        self
    }

    /// Severity of this error.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Whether a caller may retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// Suggested retry delay, if any.
    pub fn retry_after_ms(&self) -> Option<u64> {
        self.retry_after_ms
    }

    /// The canned user-facing message for this error's code.
    ///
    /// Never contains stack traces or internal details.
    pub fn user_message(&self) -> &'static str {
        self.code.user_message()
    }

    /// A metadata value, if present.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}

impl From<std::io::Error> for AgentError {
    fn from(err: std::io::Error) -> Self {
        let message = err.to_string();
        Self::new(ErrorCode::classify(&message), message).with_source(err)
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::Validation, err.to_string()).with_source(err)
    }
}

/// Wrap an arbitrary error, inferring the code from its display text.
///
/// The original error is preserved as the cause. An optional `message`
/// replaces the displayed text; the classification always runs against the
/// cause's own text.
pub fn wrap_error(
    cause: impl std::error::Error + Send + Sync + 'static,
    message: Option<&str>,
) -> AgentError {
    let cause_text = cause.to_string();
    let code = ErrorCode::classify(&cause_text);
    let message = message.map_or(cause_text, str::to_string);
    AgentError::new(code, message).with_source(cause)
}

/// Wrap an arbitrary error under an explicit code.
pub fn wrap_error_with_code(
    cause: impl std::error::Error + Send + Sync + 'static,
    code: ErrorCode,
    message: Option<&str>,
) -> AgentError {
    let message = message.map_or_else(|| cause.to_string(), str::to_string);
    AgentError::new(code, message).with_source(cause)
}

/// The user-facing message for any error, with a fallback for non-agent errors.
pub fn get_user_message<'a>(err: &'a (dyn std::error::Error + 'static), fallback: &'a str) -> &'a str {
    err.downcast_ref::<AgentError>()
        .map_or(fallback, |agent_err| agent_err.user_message())
}

#[cfg(test)]
#[path = "agent_error.test.rs"]
mod tests;
