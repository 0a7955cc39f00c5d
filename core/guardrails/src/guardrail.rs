//! The guardrail trait and verdict type.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tokio_util::sync::CancellationToken;

/// The outcome of a guardrail check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_message_ids: Vec<String>,
}

impl GuardrailVerdict {
    /// A passing verdict.
    pub fn pass() -> Self {
        Self::default()
    }

    /// A blocking verdict with a reason.
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
            blocked_message_ids: Vec::new(),
        }
    }

    /// Attach the ids of the messages that triggered the block.
    pub fn with_blocked_message_ids(mut self, ids: Vec<String>) -> Self {
        self.blocked_message_ids = ids;
        self
    }
}

/// The permission-denied error raised when a guardrail blocks a turn.
pub fn permission_denied(reason: &str, blocked_message_ids: &[String]) -> AgentError {
    let err = AgentError::new(
        ErrorCode::Authorization,
        format!("generation blocked by guardrail: {reason}"),
    );
    if blocked_message_ids.is_empty() {
        err
    } else {
        err.with_metadata(
            "blockedMessageIds",
            serde_json::json!(blocked_message_ids),
        )
    }
}

/// A pure predicate over text that may block it.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Name for logging.
    fn name(&self) -> &str {
        "guardrail"
    }

    /// Check the text. The cancellation token fires when a racing sibling
    /// already blocked; long checks should bail out early.
    async fn check(&self, text: &str, cancel: &CancellationToken) -> Result<GuardrailVerdict>;
}

type GuardrailFn = dyn Fn(String, CancellationToken) -> Pin<Box<dyn Future<Output = Result<GuardrailVerdict>> + Send>>
    + Send
    + Sync;

/// A guardrail built from a closure.
pub struct FnGuardrail {
    name: String,
    f: Box<GuardrailFn>,
}

impl FnGuardrail {
    /// Create a guardrail from an async closure.
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(String, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GuardrailVerdict>> + Send + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(move |text, cancel| Box::pin(f(text, cancel))),
        }
    }
}

#[async_trait]
impl Guardrail for FnGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, text: &str, cancel: &CancellationToken) -> Result<GuardrailVerdict> {
        (self.f)(text.to_string(), cancel.clone()).await
    }
}

#[cfg(test)]
#[path = "guardrail.test.rs"]
mod tests;
