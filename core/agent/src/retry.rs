//! The retry / fallback controller around each generation attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_error::Result;
use tandem_hooks::HookContext;
use tandem_hooks::HookEvent;
use tandem_hooks::HookOutput;
use tandem_hooks::HookRegistry;
use tracing::info;
use tracing::warn;

/// Default bound on hook-driven retries per turn.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Drives generation attempts with hook-directed retries and an at-most-once
/// fallback-model switch.
///
/// One controller lives for one turn, so the fallback budget spans every
/// model round-trip the turn performs.
pub struct RetryController {
    primary: Arc<dyn ModelDriver>,
    fallback: Option<Arc<dyn ModelDriver>>,
    hooks: Arc<HookRegistry>,
    thread_id: Option<String>,
    max_retries: u32,
    retry_attempt: u32,
    used_fallback: bool,
    on_fallback: bool,
}

impl RetryController {
    /// Create a controller for one turn.
    pub fn new(
        primary: Arc<dyn ModelDriver>,
        fallback: Option<Arc<dyn ModelDriver>>,
        hooks: Arc<HookRegistry>,
        thread_id: Option<String>,
        max_retries: u32,
    ) -> Self {
        Self {
            primary,
            fallback,
            hooks,
            thread_id,
            max_retries,
            retry_attempt: 0,
            used_fallback: false,
            on_fallback: false,
        }
    }

    /// The driver attempts currently run against.
    pub fn current_driver(&self) -> Arc<dyn ModelDriver> {
        if self.on_fallback {
            self.fallback.clone().unwrap_or_else(|| self.primary.clone())
        } else {
            self.primary.clone()
        }
    }

    /// Whether the fallback model has been switched to this turn.
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    /// Whether the error justifies switching to the fallback model.
    ///
    /// Retryable-transient only: rate limits, timeouts, network failures and
    /// upstream 5xx. Auth and validation errors never trigger fallback.
    pub fn should_use_fallback(err: &AgentError) -> bool {
        err.is_retryable() && err.code.is_transient()
    }

    /// Run one operation against the current driver, applying the retry and
    /// fallback policy on failure.
    pub async fn run<T, F, Fut>(&mut self, op: F) -> Result<T>
    where
        F: Fn(Arc<dyn ModelDriver>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        loop {
            let driver = self.current_driver();
            match op(driver.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let err = match &self.thread_id {
                        Some(thread_id) => err.with_thread_id(thread_id.clone()),
                        None => err,
                    };

                    let ctx = HookContext::new(HookEvent::PostGenerateFailure)
                        .with_metadata("error", serde_json::json!(err.message))
                        .with_metadata("code", serde_json::json!(err.code.code()));
                    let ctx = match &self.thread_id {
                        Some(thread_id) => ctx.with_thread_id(thread_id.clone()),
                        None => ctx,
                    };
                    let outputs = self.hooks.run_logged(&ctx).await;

                    let hook_retry = outputs.iter().find_map(|o| match o {
                        HookOutput::Retry { retry_delay_ms } => Some(*retry_delay_ms),
                        _ => None,
                    });

                    if let Some(delay_ms) = hook_retry {
                        if self.retry_attempt < self.max_retries {
                            self.retry_attempt += 1;
                            warn!(
                                attempt = self.retry_attempt,
                                max_retries = self.max_retries,
                                delay_ms,
                                error = %err,
                                "Retrying generation after hook request"
                            );
                            if delay_ms > 0 {
                                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                            }
                            continue;
                        }
                    }

                    if self.fallback.is_some() && !self.used_fallback && Self::should_use_fallback(&err)
                    {
                        self.used_fallback = true;
                        self.on_fallback = true;
                        info!(
                            from = driver.name(),
                            error = %err,
                            "Switching to fallback model"
                        );
                        continue;
                    }

                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry.test.rs"]
mod tests;
