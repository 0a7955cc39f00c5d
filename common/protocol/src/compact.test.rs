use super::*;

#[test]
fn test_policy_defaults() {
    let policy = CompactionPolicy::default();
    assert!(policy.enabled);
    assert!((policy.token_threshold - 0.8).abs() < f64::EPSILON);
    assert!((policy.hard_cap_threshold - 0.95).abs() < f64::EPSILON);
}

#[test]
fn test_summarization_defaults() {
    let config = SummarizationConfig::default();
    assert_eq!(config.keep_message_count, 5);
    assert_eq!(config.keep_tool_result_count, 3);
    assert_eq!(config.strategy, SummarizationStrategy::Rollup);
}

#[test]
fn test_scheduler_defaults() {
    let config = SchedulerConfig::default();
    assert!(!config.enable_background_compaction);
    assert_eq!(config.debounce_delay_ms, 500);
    assert_eq!(config.max_pending_tasks, 4);
}

#[test]
fn test_context_config_deserializes_from_empty() {
    let config: ContextConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.max_tokens, 200_000);
    assert!(config.scheduler.is_none());
}

#[test]
fn test_decision_constructors() {
    let skip = CompactDecision::skip();
    assert!(!skip.trigger);
    assert!(skip.reason.is_none());

    let hard = CompactDecision::trigger(CompactReason::HardCap);
    assert!(hard.trigger);
    assert_eq!(hard.reason, Some(CompactReason::HardCap));
}

#[test]
fn test_reason_serde() {
    assert_eq!(
        serde_json::to_string(&CompactReason::TokenThreshold).unwrap(),
        "\"token_threshold\""
    );
    assert_eq!(
        serde_json::to_string(&CompactReason::HardCap).unwrap(),
        "\"hard_cap\""
    );
}
