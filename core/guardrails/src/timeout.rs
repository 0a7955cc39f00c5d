//! Timeout wrapper for slow guardrails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tandem_error::Result;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::guardrail::Guardrail;
use crate::guardrail::GuardrailVerdict;

/// Wraps a guardrail with a deadline.
///
/// On timeout the wrapper fails open (`blocked: false`) by default; with
/// fail-open disabled the text is blocked with reason
/// "Guardrail check timed out".
pub struct TimeoutGuardrail {
    inner: Arc<dyn Guardrail>,
    timeout: Duration,
    fail_open: bool,
}

impl TimeoutGuardrail {
    /// Wrap a guardrail with a fail-open timeout.
    pub fn new(inner: Arc<dyn Guardrail>, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            fail_open: true,
        }
    }

    /// Disable fail-open: timeouts block.
    pub fn fail_closed(mut self) -> Self {
        self.fail_open = false;
        self
    }
}

#[async_trait]
impl Guardrail for TimeoutGuardrail {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn check(&self, text: &str, cancel: &CancellationToken) -> Result<GuardrailVerdict> {
        match tokio::time::timeout(self.timeout, self.inner.check(text, cancel)).await {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!(
                    guardrail = self.inner.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    fail_open = self.fail_open,
                    "Guardrail check timed out"
                );
                if self.fail_open {
                    Ok(GuardrailVerdict::pass())
                } else {
                    Ok(GuardrailVerdict::block("Guardrail check timed out"))
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "timeout.test.rs"]
mod tests;
