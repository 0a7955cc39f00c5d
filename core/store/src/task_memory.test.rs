use super::*;
use tandem_protocol::TaskStatus;

#[tokio::test]
async fn test_save_load_delete() {
    let store = MemoryTaskStore::new();
    let task = BackgroundTask::new("researcher", "find things");
    let id = task.id.clone();

    store.save(task).await.unwrap();
    let loaded = store.load(&id).await.unwrap().unwrap();
    assert_eq!(loaded.id, id);

    assert!(store.delete(&id).await.unwrap());
    assert!(store.load(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_with_filter() {
    let store = MemoryTaskStore::new();

    let mut running = BackgroundTask::new("researcher", "a");
    running.transition(TaskStatus::Running);
    let mut done = BackgroundTask::new("coder", "b");
    done.transition(TaskStatus::Completed);

    store.save(running).await.unwrap();
    store.save(done).await.unwrap();

    let all = store.list(&TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let only_running = store
        .list(&TaskFilter {
            status: Some(TaskStatus::Running),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_running.len(), 1);
    assert_eq!(only_running[0].subagent_type, "researcher");

    let only_coder = store
        .list(&TaskFilter {
            subagent_type: Some("coder".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(only_coder.len(), 1);
}

#[tokio::test]
async fn test_namespace_isolation() {
    let store_a = MemoryTaskStore::with_config(TaskStoreConfig::with_namespace("a"));
    let task = BackgroundTask::new("researcher", "work");
    let id = task.id.clone();
    store_a.save(task).await.unwrap();

    // Same id, different namespace: invisible.
    let store_b = MemoryTaskStore::with_config(TaskStoreConfig::with_namespace("b"));
    assert!(store_b.load(&id).await.unwrap().is_none());
    assert!(store_a.load(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cleanup_respects_ttl() {
    let store =
        MemoryTaskStore::with_config(TaskStoreConfig::with_ttl(std::time::Duration::from_millis(0)));

    let mut terminal = BackgroundTask::new("researcher", "done work");
    terminal.transition(TaskStatus::Completed);
    let mut active = BackgroundTask::new("researcher", "ongoing");
    active.transition(TaskStatus::Running);
    let active_id = active.id.clone();

    store.save(terminal).await.unwrap();
    store.save(active).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let removed = store.cleanup().await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.load(&active_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cleanup_without_ttl_is_noop() {
    let store = MemoryTaskStore::new();
    let mut task = BackgroundTask::new("researcher", "work");
    task.transition(TaskStatus::Completed);
    store.save(task).await.unwrap();

    assert_eq!(store.cleanup().await.unwrap(), 0);
}
