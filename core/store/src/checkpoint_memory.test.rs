use super::*;
use tandem_protocol::InterruptKind;
use tandem_protocol::Message;

#[tokio::test]
async fn test_load_missing_is_none() {
    let store = MemoryCheckpointer::new();
    assert!(store.load("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_assigns_increasing_steps() {
    let store = MemoryCheckpointer::new();

    let first = store.save(Checkpoint::new("t1")).await.unwrap();
    assert_eq!(first.step, 1);

    let second = store.save(Checkpoint::new("t1")).await.unwrap();
    assert_eq!(second.step, 2);

    let third = store.save(Checkpoint::new("t1")).await.unwrap();
    assert_eq!(third.step, 3);
}

#[tokio::test]
async fn test_steps_are_per_thread() {
    let store = MemoryCheckpointer::new();
    store.save(Checkpoint::new("a")).await.unwrap();
    store.save(Checkpoint::new("a")).await.unwrap();

    let other = store.save(Checkpoint::new("b")).await.unwrap();
    assert_eq!(other.step, 1);
}

#[tokio::test]
async fn test_created_at_preserved_across_saves() {
    let store = MemoryCheckpointer::new();
    let first = store.save(Checkpoint::new("t1")).await.unwrap();
    let second = store.save(Checkpoint::new("t1")).await.unwrap();
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn test_save_preserves_pending_interrupt() {
    let store = MemoryCheckpointer::new();
    let mut checkpoint = Checkpoint::new("t1");
    checkpoint.pending_interrupt = Some(tandem_protocol::Interrupt::new(
        "t1",
        InterruptKind::Approval,
        "call_1",
        "write",
        serde_json::json!({}),
    ));
    store.save(checkpoint).await.unwrap();

    let loaded = store.load("t1").await.unwrap().unwrap();
    assert_eq!(loaded.pending_interrupt.unwrap().id, "int_call_1");
}

#[tokio::test]
async fn test_delete() {
    let store = MemoryCheckpointer::new();
    store.save(Checkpoint::new("t1")).await.unwrap();
    assert!(store.delete("t1").await.unwrap());
    assert!(!store.delete("t1").await.unwrap());
    assert!(store.load("t1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_saves_serialise() {
    let store = std::sync::Arc::new(MemoryCheckpointer::new());
    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let mut checkpoint = Checkpoint::new("t1");
            checkpoint.messages.push(Message::user("x"));
            store.save(checkpoint).await.unwrap().step
        }));
    }

    let mut steps: Vec<u64> = Vec::new();
    for handle in handles {
        steps.push(handle.await.unwrap());
    }
    steps.sort_unstable();
    assert_eq!(steps, (1..=10).collect::<Vec<_>>());
}
