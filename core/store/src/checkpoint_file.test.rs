use super::*;
use tempfile::TempDir;

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointer::new(dir.path());

    let mut checkpoint = Checkpoint::new("thread-1");
    checkpoint
        .messages
        .push(tandem_protocol::Message::user("hello"));
    let saved = store.save(checkpoint).await.unwrap();
    assert_eq!(saved.step, 1);

    let loaded = store.load("thread-1").await.unwrap().unwrap();
    assert_eq!(loaded.step, 1);
    assert_eq!(loaded.messages.len(), 1);
}

#[tokio::test]
async fn test_missing_thread_is_none() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointer::new(dir.path());
    assert!(store.load("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_steps_increase_across_instances() {
    let dir = TempDir::new().unwrap();

    {
        let store = FileCheckpointer::new(dir.path());
        store.save(Checkpoint::new("t")).await.unwrap();
    }

    // A fresh instance continues the step sequence from disk.
    let store = FileCheckpointer::new(dir.path());
    let saved = store.save(Checkpoint::new("t")).await.unwrap();
    assert_eq!(saved.step, 2);
}

#[tokio::test]
async fn test_delete() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointer::new(dir.path());
    store.save(Checkpoint::new("t")).await.unwrap();
    assert!(store.delete("t").await.unwrap());
    assert!(!store.delete("t").await.unwrap());
}

#[tokio::test]
async fn test_corrupt_record_fails_load() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointer::new(dir.path());
    tokio::fs::create_dir_all(dir.path()).await.unwrap();
    tokio::fs::write(dir.path().join("bad.json"), "{not json")
        .await
        .unwrap();

    let err = store.load("bad").await.unwrap_err();
    assert_eq!(err.code, tandem_error::ErrorCode::Checkpoint);
    assert!(!err.is_retryable());
    assert_eq!(
        err.metadata_value("operation").and_then(|v| v.as_str()),
        Some("load")
    );
}

#[tokio::test]
async fn test_unsafe_thread_ids_are_sanitised() {
    let dir = TempDir::new().unwrap();
    let store = FileCheckpointer::new(dir.path());
    store.save(Checkpoint::new("a/b../c")).await.unwrap();
    let loaded = store.load("a/b../c").await.unwrap().unwrap();
    assert_eq!(loaded.thread_id, "a/b../c");
}
