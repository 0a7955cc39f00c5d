//! The context manager.

use std::sync::Arc;
use std::sync::Mutex;

use sha2::Digest;
use sha2::Sha256;
use tandem_error::Result;
use tandem_hooks::HookContext;
use tandem_hooks::HookEvent;
use tandem_hooks::HookRegistry;
use tandem_protocol::CompactDecision;
use tandem_protocol::CompactReason;
use tandem_protocol::CompactionResult;
use tandem_protocol::ContextConfig;
use tandem_protocol::Message;
use tandem_protocol::Role;
use tandem_protocol::TokenBudget;
use tandem_tokens::EstimatingCounter;
use tandem_tokens::TokenCounter;
use tracing::debug;
use tracing::info;

use crate::scheduler::CompactionScheduler;
use crate::summarizer::Summarizer;
use crate::summarizer::build_summary_prompt;

/// Callback invoked with every compaction result.
pub type OnCompact = Arc<dyn Fn(&CompactionResult) + Send + Sync>;

/// A cheap fingerprint of a message list, used to decide whether a recorded
/// usage stamp is still fresh.
pub fn messages_fingerprint(messages: &[Message]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_string(messages).unwrap_or_default().as_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

#[derive(Debug, Clone, Copy)]
struct UsageStamp {
    total_tokens: i64,
    fingerprint: u64,
}

/// Decides when and how to compact the conversation.
pub struct ContextManager {
    config: ContextConfig,
    counter: Arc<dyn TokenCounter>,
    hooks: Arc<HookRegistry>,
    on_compact: Option<OnCompact>,
    scheduler: Option<CompactionScheduler>,
    // Single-slot latest actual usage; readers always see a consistent pair.
    last_usage: Mutex<Option<UsageStamp>>,
}

impl ContextManager {
    /// Create a manager with the default estimating counter.
    pub fn new(config: ContextConfig) -> Self {
        Self::with_counter(config, Arc::new(EstimatingCounter::new()))
    }

    /// Create a manager with a custom token counter.
    pub fn with_counter(config: ContextConfig, counter: Arc<dyn TokenCounter>) -> Self {
        let scheduler = config
            .scheduler
            .as_ref()
            .filter(|s| s.enable_background_compaction)
            .map(|s| CompactionScheduler::new(s.clone()));
        Self {
            config,
            counter,
            hooks: Arc::new(HookRegistry::new()),
            on_compact: None,
            scheduler,
            last_usage: Mutex::new(None),
        }
    }

    /// Attach the hook registry used for `PreCompact`/`PostCompact`.
    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Attach the `on_compact` callback.
    pub fn with_on_compact(mut self, on_compact: OnCompact) -> Self {
        self.on_compact = Some(on_compact);
        self
    }

    /// The manager's configuration.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The background scheduler, when enabled.
    pub fn scheduler(&self) -> Option<&CompactionScheduler> {
        self.scheduler.as_ref()
    }

    /// Record a model-reported usage total for the given message list.
    pub fn record_usage(&self, messages: &[Message], total_tokens: i64) {
        let stamp = UsageStamp {
            total_tokens,
            fingerprint: messages_fingerprint(messages),
        };
        if let Ok(mut slot) = self.last_usage.lock() {
            *slot = Some(stamp);
        }
    }

    /// The current token budget.
    ///
    /// The latest model-reported usage wins when it is fresher than any
    /// message change; otherwise the counter's estimate is used.
    pub fn budget(&self, messages: &[Message]) -> TokenBudget {
        let fingerprint = messages_fingerprint(messages);
        let stamp = self.last_usage.lock().ok().and_then(|slot| *slot);

        match stamp {
            Some(stamp) if stamp.fingerprint == fingerprint => {
                TokenBudget::new(self.config.max_tokens, stamp.total_tokens, true)
            }
            _ => TokenBudget::new(
                self.config.max_tokens,
                self.counter.count_messages(messages),
                false,
            ),
        }
    }

    /// Decide whether the conversation needs compaction.
    pub fn should_compact(&self, messages: &[Message]) -> CompactDecision {
        if !self.config.policy.enabled {
            return CompactDecision::skip();
        }

        let budget = self.budget(messages);
        let usage = budget.usage();

        let decision = if usage >= self.config.policy.hard_cap_threshold {
            CompactDecision::trigger(CompactReason::HardCap)
        } else if usage >= self.config.policy.token_threshold {
            CompactDecision::trigger(CompactReason::TokenThreshold)
        } else {
            CompactDecision::skip()
        };

        debug!(
            usage = format!("{:.2}", usage),
            is_actual = budget.is_actual,
            trigger = decision.trigger,
            "Compaction check"
        );
        decision
    }

    /// Run one compaction pass over the messages.
    ///
    /// Returns `None` when the compaction set is empty (nothing between the
    /// system message and the kept tail). Fires `PreCompact` (a blocking hook
    /// output skips the pass) and `PostCompact`; hook failures are logged and
    /// swallowed.
    pub async fn compact(
        &self,
        messages: &[Message],
        summarizer: &dyn Summarizer,
    ) -> Result<Option<CompactionResult>> {
        let keep = self.config.summarization.keep_message_count;

        let (system, body) = match messages.first() {
            Some(m) if m.role == Role::System => (Some(m.clone()), &messages[1..]),
            _ => (None, messages),
        };

        // A single-message compaction set would be replaced by a summary of
        // the same length; only roll up when it actually shrinks the list.
        if body.len() <= keep + 1 {
            return Ok(None);
        }

        // PreCompact hooks may veto the pass.
        let pre_ctx = HookContext::new(HookEvent::PreCompact);
        for output in self.hooks.run_logged(&pre_ctx).await {
            if let Some(reason) = output.block_reason() {
                info!(reason, "Compaction skipped by hook");
                return Ok(None);
            }
        }

        let split = body.len() - keep;
        let compaction_set = &body[..split];
        let kept_tail = &body[split..];

        let tokens_before = self.counter.count_messages(messages);

        let prompt = build_summary_prompt(
            compaction_set,
            self.config.summarization.keep_tool_result_count,
        );
        let summary = summarizer.summarize(&prompt).await?;

        let summary_message =
            Message::user(format!("## Conversation Summary\n\n{summary}"));

        let mut new_messages = Vec::with_capacity(2 + kept_tail.len());
        if let Some(system) = system {
            new_messages.push(system);
        }
        new_messages.push(summary_message);
        new_messages.extend(kept_tail.iter().cloned());

        let tokens_after = self.counter.count_messages(&new_messages);
        let result = CompactionResult {
            summary,
            compacted_messages: compaction_set.to_vec(),
            new_messages,
            messages_before: messages.len(),
            messages_after: kept_tail.len() + 1 + usize::from(messages.len() > body.len()),
            tokens_before,
            tokens_after,
            tokens_saved: (tokens_before - tokens_after).max(0),
        };

        info!(
            messages_before = result.messages_before,
            messages_after = result.messages_after,
            tokens_saved = result.tokens_saved,
            "Compaction complete"
        );

        self.emit_result(&result).await;
        Ok(Some(result))
    }

    async fn emit_result(&self, result: &CompactionResult) {
        if let Some(on_compact) = &self.on_compact {
            on_compact(result);
        }
        let post_ctx = HookContext::new(HookEvent::PostCompact).with_metadata(
            "compaction",
            serde_json::to_value(result).unwrap_or_default(),
        );
        let _ = self.hooks.run_logged(&post_ctx).await;
    }

    /// Apply compaction to a message list as part of a turn.
    ///
    /// Synchronous mode compacts in-line when the policy triggers. With
    /// background compaction enabled, the latest completed background result
    /// is applied if one is ready; otherwise a task is scheduled and the
    /// original messages are returned unchanged.
    pub async fn process(
        &self,
        messages: Vec<Message>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Vec<Message>> {
        if !self.config.policy.enabled {
            return Ok(messages);
        }

        if let Some(scheduler) = &self.scheduler {
            if let Some(result) = scheduler.take_latest_result() {
                self.emit_result(&result).await;
                return Ok(result.new_messages);
            }

            if self.should_compact(&messages).trigger {
                // PreCompact hooks may veto background passes too.
                let pre_ctx = HookContext::new(HookEvent::PreCompact);
                let vetoed = self
                    .hooks
                    .run_logged(&pre_ctx)
                    .await
                    .iter()
                    .any(tandem_hooks::HookOutput::is_block);
                if !vetoed {
                    self.schedule_background(scheduler, messages.clone(), summarizer);
                }
            }
            return Ok(messages);
        }

        if self.should_compact(&messages).trigger {
            if let Some(result) = self.compact(&messages, summarizer.as_ref()).await? {
                return Ok(result.new_messages);
            }
        }
        Ok(messages)
    }

    fn schedule_background(
        &self,
        scheduler: &CompactionScheduler,
        messages: Vec<Message>,
        summarizer: Arc<dyn Summarizer>,
    ) {
        let keep = self.config.summarization.keep_message_count;
        let keep_tool_results = self.config.summarization.keep_tool_result_count;
        let counter = self.counter.clone();

        let outcome = scheduler.schedule(move || {
            Box::pin(async move {
                compact_in_background(messages, summarizer, keep, keep_tool_results, counter).await
            })
        });
        if let Err(e) = outcome {
            debug!(error = %e, "Background compaction not scheduled");
        }
    }
}

/// The compaction body run inside a background task.
///
/// Mirrors [`ContextManager::compact`] minus hook dispatch, which happens
/// when the result is applied on a later `process` call.
async fn compact_in_background(
    messages: Vec<Message>,
    summarizer: Arc<dyn Summarizer>,
    keep: usize,
    keep_tool_results: usize,
    counter: Arc<dyn TokenCounter>,
) -> Result<Option<CompactionResult>> {
    let (system, body) = match messages.first() {
        Some(m) if m.role == Role::System => (Some(m.clone()), &messages[1..]),
        _ => (None, &messages[..]),
    };

    if body.len() <= keep + 1 {
        return Ok(None);
    }

    let split = body.len() - keep;
    let compaction_set = &body[..split];
    let kept_tail = &body[split..];

    let tokens_before = counter.count_messages(&messages);
    let prompt = build_summary_prompt(compaction_set, keep_tool_results);
    let summary = summarizer.summarize(&prompt).await?;

    let summary_message = Message::user(format!("## Conversation Summary\n\n{summary}"));
    let mut new_messages = Vec::with_capacity(2 + kept_tail.len());
    let had_system = system.is_some();
    if let Some(system) = system {
        new_messages.push(system);
    }
    new_messages.push(summary_message);
    new_messages.extend(kept_tail.iter().cloned());

    let tokens_after = counter.count_messages(&new_messages);
    Ok(Some(CompactionResult {
        summary,
        compacted_messages: compaction_set.to_vec(),
        new_messages,
        messages_before: messages.len(),
        messages_after: kept_tail.len() + 1 + usize::from(had_system),
        tokens_before,
        tokens_after,
        tokens_saved: (tokens_before - tokens_after).max(0),
    }))
}

#[cfg(test)]
#[path = "manager.test.rs"]
mod tests;
