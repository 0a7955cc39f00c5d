use super::*;
use crate::kv::MemoryKv;
use tandem_protocol::TaskStatus;

fn kv_store() -> KvTaskStore {
    KvTaskStore::new(Arc::new(MemoryKv::new()))
}

#[tokio::test]
async fn test_round_trip() {
    let store = kv_store();
    let task = BackgroundTask::new("researcher", "kv work");
    let id = task.id.clone();

    store.save(task).await.unwrap();
    let loaded = store.load(&id).await.unwrap().unwrap();
    assert_eq!(loaded.description, "kv work");

    assert!(store.delete(&id).await.unwrap());
    assert!(store.load(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_shared_backend_with_namespaces() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryKv::new());
    let store_a = KvTaskStore::with_config(kv.clone(), TaskStoreConfig::with_namespace("a"));
    let store_b = KvTaskStore::with_config(kv, TaskStoreConfig::with_namespace("b"));

    let task = BackgroundTask::new("researcher", "namespaced");
    let id = task.id.clone();
    store_a.save(task).await.unwrap();

    assert!(store_a.load(&id).await.unwrap().is_some());
    assert!(store_b.load(&id).await.unwrap().is_none());
    assert!(store_b.list(&TaskFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters() {
    let store = kv_store();
    let mut running = BackgroundTask::new("researcher", "a");
    running.transition(TaskStatus::Running);
    store.save(running).await.unwrap();
    store.save(BackgroundTask::new("coder", "b")).await.unwrap();

    let filtered = store
        .list(&TaskFilter {
            status: Some(TaskStatus::Running),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn test_corrupt_record_errors() {
    let kv = Arc::new(MemoryKv::new());
    let store = KvTaskStore::new(kv.clone());
    kv.set("task_bad", "{not json".to_string()).await.unwrap();

    let err = store.load("task_bad").await.unwrap_err();
    assert_eq!(err.code, tandem_error::ErrorCode::Backend);
}
