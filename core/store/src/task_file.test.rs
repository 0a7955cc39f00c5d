use super::*;
use tandem_protocol::TaskStatus;
use tempfile::TempDir;

#[tokio::test]
async fn test_round_trip_across_instances() {
    let dir = TempDir::new().unwrap();
    let task = BackgroundTask::new("researcher", "durable work");
    let id = task.id.clone();

    {
        let store = FileTaskStore::new(dir.path());
        store.save(task).await.unwrap();
    }

    // A fresh instance recovers the full record from disk.
    let store = FileTaskStore::new(dir.path());
    let loaded = store.load(&id).await.unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.description, "durable work");
}

#[tokio::test]
async fn test_list_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = FileTaskStore::new(dir.path());

    let first = BackgroundTask::new("researcher", "a");
    let second = BackgroundTask::new("coder", "b");
    let first_id = first.id.clone();
    store.save(first).await.unwrap();
    store.save(second).await.unwrap();

    let all = store.list(&TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    assert!(store.delete(&first_id).await.unwrap());
    let remaining = store.list(&TaskFilter::default()).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].subagent_type, "coder");
}

#[tokio::test]
async fn test_namespaces_share_directory() {
    let dir = TempDir::new().unwrap();
    let store_a = FileTaskStore::with_config(dir.path(), TaskStoreConfig::with_namespace("a"));
    let store_b = FileTaskStore::with_config(dir.path(), TaskStoreConfig::with_namespace("b"));

    let task_a = BackgroundTask::new("researcher", "for a");
    let id_a = task_a.id.clone();
    store_a.save(task_a).await.unwrap();
    store_b
        .save(BackgroundTask::new("coder", "for b"))
        .await
        .unwrap();

    assert!(store_b.load(&id_a).await.unwrap().is_none());
    assert_eq!(store_a.list(&TaskFilter::default()).await.unwrap().len(), 1);
    assert_eq!(store_b.list(&TaskFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cleanup_removes_expired_terminal_tasks() {
    let dir = TempDir::new().unwrap();
    let store = FileTaskStore::with_config(
        dir.path(),
        TaskStoreConfig::with_ttl(std::time::Duration::from_millis(0)),
    );

    let mut done = BackgroundTask::new("researcher", "done");
    done.transition(TaskStatus::Failed);
    store.save(done).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert_eq!(store.cleanup().await.unwrap(), 1);
    assert!(store.list(&TaskFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_empty_directory() {
    let dir = TempDir::new().unwrap();
    let store = FileTaskStore::new(dir.path().join("never-created"));
    assert!(store.list(&TaskFilter::default()).await.unwrap().is_empty());
}
