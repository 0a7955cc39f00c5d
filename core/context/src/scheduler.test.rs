use super::*;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_protocol::Message;

fn fast_config() -> SchedulerConfig {
    SchedulerConfig {
        enable_background_compaction: true,
        debounce_delay_ms: 10,
        max_pending_tasks: 2,
    }
}

fn dummy_result() -> CompactionResult {
    CompactionResult {
        summary: "summary".to_string(),
        compacted_messages: vec![Message::user("old")],
        new_messages: vec![Message::user("## Conversation Summary\n\nsummary")],
        messages_before: 5,
        messages_after: 1,
        tokens_before: 100,
        tokens_after: 20,
        tokens_saved: 80,
    }
}

#[tokio::test]
async fn test_schedule_executes_after_debounce() {
    let scheduler = CompactionScheduler::new(fast_config());
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_clone = ran.clone();

    let id = scheduler
        .schedule(move || {
            Box::pin(async move {
                ran_clone.fetch_add(1, Ordering::SeqCst);
                Ok(Some(dummy_result()))
            })
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.status(id), Some(ScheduledTaskStatus::Completed));

    let result = scheduler.take_latest_result().unwrap();
    assert_eq!(result.tokens_saved, 80);
    // The result is consumed once.
    assert!(scheduler.take_latest_result().is_none());
}

#[tokio::test]
async fn test_cancel_pending_succeeds() {
    let config = SchedulerConfig {
        debounce_delay_ms: 5_000,
        ..fast_config()
    };
    let scheduler = CompactionScheduler::new(config);

    let id = scheduler
        .schedule(|| Box::pin(async { Ok(Some(dummy_result())) }))
        .unwrap();
    assert_eq!(scheduler.status(id), Some(ScheduledTaskStatus::Pending));

    scheduler.cancel(id).unwrap();
    assert_eq!(scheduler.status(id), Some(ScheduledTaskStatus::Cancelled));
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_completed_fails() {
    let scheduler = CompactionScheduler::new(fast_config());
    let id = scheduler
        .schedule(|| Box::pin(async { Ok(Some(dummy_result())) }))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(scheduler.cancel(id).is_err());
}

#[tokio::test]
async fn test_overflow_drops_oldest() {
    let config = SchedulerConfig {
        debounce_delay_ms: 5_000,
        max_pending_tasks: 2,
        ..fast_config()
    };
    let scheduler = CompactionScheduler::new(config);

    let first = scheduler
        .schedule(|| Box::pin(async { Ok(None) }))
        .unwrap();
    let second = scheduler
        .schedule(|| Box::pin(async { Ok(None) }))
        .unwrap();
    let third = scheduler
        .schedule(|| Box::pin(async { Ok(None) }))
        .unwrap();

    assert_eq!(scheduler.status(first), Some(ScheduledTaskStatus::Cancelled));
    assert_eq!(scheduler.status(second), Some(ScheduledTaskStatus::Pending));
    assert_eq!(scheduler.status(third), Some(ScheduledTaskStatus::Pending));
    assert_eq!(scheduler.pending_count(), 2);
}

#[tokio::test]
async fn test_shutdown_fails_pending_and_rejects_new() {
    let config = SchedulerConfig {
        debounce_delay_ms: 5_000,
        ..fast_config()
    };
    let scheduler = CompactionScheduler::new(config);

    let id = scheduler
        .schedule(|| Box::pin(async { Ok(None) }))
        .unwrap();

    scheduler.shutdown();
    assert_eq!(
        scheduler.status(id),
        Some(ScheduledTaskStatus::Failed("Scheduler shut down".to_string()))
    );

    let err = scheduler
        .schedule(|| Box::pin(async { Ok(None) }))
        .unwrap_err();
    assert!(err.message.contains("Scheduler shut down"));
}

#[tokio::test]
async fn test_failed_job_records_error() {
    let scheduler = CompactionScheduler::new(fast_config());
    let id = scheduler
        .schedule(|| {
            Box::pin(async { Err(tandem_error::AgentError::validation("summarizer broke")) })
        })
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    match scheduler.status(id) {
        Some(ScheduledTaskStatus::Failed(message)) => {
            assert!(message.contains("summarizer broke"));
        }
        other => panic!("expected failed status, got {other:?}"),
    }
    assert!(scheduler.take_latest_result().is_none());
}

#[tokio::test]
async fn test_fifo_order() {
    let scheduler = CompactionScheduler::new(SchedulerConfig {
        debounce_delay_ms: 10,
        max_pending_tasks: 4,
        ..fast_config()
    });
    let order = Arc::new(Mutex::new(Vec::new()));

    for label in [1, 2, 3] {
        let order = order.clone();
        scheduler
            .schedule(move || {
                Box::pin(async move {
                    order.lock().unwrap_or_else(|e| e.into_inner()).push(label);
                    Ok(None)
                })
            })
            .unwrap();
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*order.lock().unwrap_or_else(|e| e.into_inner()), vec![1, 2, 3]);
}
