use super::*;
use async_trait::async_trait;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_protocol::CompactionPolicy;
use tandem_protocol::SummarizationConfig;

struct FixedSummarizer {
    calls: AtomicUsize,
}

impl FixedSummarizer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn summarize(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("the conversation so far".to_string())
    }
}

fn config(max_tokens: i64, token_threshold: f64, keep: usize) -> ContextConfig {
    ContextConfig {
        max_tokens,
        policy: CompactionPolicy {
            enabled: true,
            token_threshold,
            hard_cap_threshold: 0.95,
        },
        summarization: SummarizationConfig {
            keep_message_count: keep,
            ..Default::default()
        },
        scheduler: None,
    }
}

fn long_conversation(turns: usize) -> Vec<Message> {
    let mut messages = vec![Message::system("be helpful")];
    for i in 0..turns {
        messages.push(Message::user(format!(
            "question {i}: {}",
            "lorem ipsum dolor sit amet ".repeat(5)
        )));
        messages.push(Message::assistant(format!(
            "answer {i}: {}",
            "consectetur adipiscing elit ".repeat(5)
        )));
    }
    messages
}

#[test]
fn test_budget_estimates_without_usage() {
    let manager = ContextManager::new(config(1000, 0.8, 2));
    let messages = vec![Message::user("hello")];
    let budget = manager.budget(&messages);
    assert!(!budget.is_actual);
    assert!(budget.current_tokens > 0);
}

#[test]
fn test_budget_uses_actual_when_fresh() {
    let manager = ContextManager::new(config(1000, 0.8, 2));
    let messages = vec![Message::user("hello")];

    manager.record_usage(&messages, 123);
    let budget = manager.budget(&messages);
    assert!(budget.is_actual);
    assert_eq!(budget.current_tokens, 123);
}

#[test]
fn test_budget_falls_back_when_messages_change() {
    let manager = ContextManager::new(config(1000, 0.8, 2));
    let messages = vec![Message::user("hello")];
    manager.record_usage(&messages, 123);

    let mut changed = messages.clone();
    changed.push(Message::assistant("hi"));
    let budget = manager.budget(&changed);
    assert!(!budget.is_actual);
}

#[test]
fn test_should_compact_thresholds() {
    let manager = ContextManager::new(config(100, 0.1, 2));
    let messages = long_conversation(4);

    let decision = manager.should_compact(&messages);
    assert!(decision.trigger);

    // Hard cap dominates when usage is extreme.
    manager.record_usage(&messages, 99);
    let decision = manager.should_compact(&messages);
    assert_eq!(decision.reason, Some(CompactReason::HardCap));
}

#[test]
fn test_should_compact_disabled_policy() {
    let mut cfg = config(100, 0.1, 2);
    cfg.policy.enabled = false;
    let manager = ContextManager::new(cfg);

    let decision = manager.should_compact(&long_conversation(4));
    assert!(!decision.trigger);
    assert!(decision.reason.is_none());
}

#[tokio::test]
async fn test_compact_rollup_shape() {
    let manager = ContextManager::new(config(100, 0.1, 2));
    let summarizer = FixedSummarizer::new();
    let messages = long_conversation(4);

    let result = manager
        .compact(&messages, summarizer.as_ref())
        .await
        .unwrap()
        .unwrap();

    assert!(result.messages_after < result.messages_before);
    assert!(result.tokens_after < result.tokens_before);

    // system + summary + kept tail of 2.
    assert_eq!(result.new_messages.len(), 4);
    assert_eq!(result.new_messages[0].role, Role::System);
    let summary = &result.new_messages[1];
    assert_eq!(summary.role, Role::User);
    assert!(summary.text().starts_with("## Conversation Summary"));
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_compact_empty_set_returns_none() {
    let manager = ContextManager::new(config(100, 0.1, 10));
    let summarizer = FixedSummarizer::new();
    let messages = vec![Message::system("sys"), Message::user("hi")];

    let result = manager.compact(&messages, summarizer.as_ref()).await.unwrap();
    assert!(result.is_none());
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_compact_without_system_message() {
    let manager = ContextManager::new(config(100, 0.1, 1));
    let summarizer = FixedSummarizer::new();
    let messages: Vec<Message> = (0..5).map(|i| Message::user(format!("m{i}"))).collect();

    let result = manager
        .compact(&messages, summarizer.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.new_messages.len(), 2);
    assert!(result.new_messages[0].text().starts_with("## Conversation Summary"));
}

#[tokio::test]
async fn test_on_compact_callback_fires() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_clone = seen.clone();
    let manager = ContextManager::new(config(100, 0.1, 2)).with_on_compact(Arc::new(
        move |result: &CompactionResult| {
            assert!(result.messages_after < result.messages_before);
            seen_clone.fetch_add(1, Ordering::SeqCst);
        },
    ));

    let summarizer = FixedSummarizer::new();
    manager
        .compact(&long_conversation(4), summarizer.as_ref())
        .await
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pre_compact_hook_vetoes() {
    let hooks = Arc::new(HookRegistry::new());
    hooks.register(
        HookEvent::PreCompact,
        Arc::new(tandem_hooks::FnHook::new("veto", |_ctx| async {
            Ok(tandem_hooks::HookOutput::Block {
                reason: "not now".to_string(),
            })
        })),
    );
    let manager = ContextManager::new(config(100, 0.1, 2)).with_hooks(hooks);

    let summarizer = FixedSummarizer::new();
    let result = manager
        .compact(&long_conversation(4), summarizer.as_ref())
        .await
        .unwrap();
    assert!(result.is_none());
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_process_sync_compacts_over_threshold() {
    let manager = ContextManager::new(config(100, 0.1, 2));
    let summarizer: Arc<dyn Summarizer> = FixedSummarizer::new();
    let messages = long_conversation(4);
    let before = messages.len();

    let processed = manager.process(messages, summarizer).await.unwrap();
    assert!(processed.len() < before);
}

#[tokio::test]
async fn test_process_below_threshold_is_identity() {
    let manager = ContextManager::new(config(1_000_000, 0.8, 2));
    let summarizer: Arc<dyn Summarizer> = FixedSummarizer::new();
    let messages = long_conversation(2);

    let processed = manager.process(messages.clone(), summarizer).await.unwrap();
    assert_eq!(processed, messages);
}

#[tokio::test]
async fn test_background_process_applies_result_on_later_call() {
    let mut cfg = config(100, 0.1, 2);
    cfg.scheduler = Some(tandem_protocol::SchedulerConfig {
        enable_background_compaction: true,
        debounce_delay_ms: 10,
        max_pending_tasks: 2,
    });
    let manager = ContextManager::new(cfg);
    let summarizer: Arc<dyn Summarizer> = FixedSummarizer::new();
    let messages = long_conversation(4);

    // First call schedules and returns the original messages untouched.
    let processed = manager
        .process(messages.clone(), summarizer.clone())
        .await
        .unwrap();
    assert_eq!(processed, messages);

    // After the background task completes, the next call applies it.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let processed = manager.process(messages.clone(), summarizer).await.unwrap();
    assert!(processed.len() < messages.len());
    assert!(processed
        .iter()
        .any(|m| m.text().starts_with("## Conversation Summary")));
}

#[test]
fn test_fingerprint_changes_with_content() {
    let a = messages_fingerprint(&[Message::user("one")]);
    let b = messages_fingerprint(&[Message::user("two")]);
    let a2 = messages_fingerprint(&[Message::user("one")]);
    assert_ne!(a, b);
    assert_eq!(a, a2);
}
