use super::*;
use tandem_store::TaskStoreConfig;

fn manager() -> Arc<TaskManager> {
    Arc::new(TaskManager::default())
}

#[tokio::test]
async fn test_create_registers_and_persists() {
    let store = Arc::new(MemoryTaskStore::new());
    let manager = TaskManager::new(store.clone());

    let task = manager.create("researcher", "dig").await.unwrap();
    assert!(manager.is_registered(&task.id).await);

    // Persisted through the store on registration.
    let stored = store.load(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_lifecycle_persists_each_change() {
    let store = Arc::new(MemoryTaskStore::new());
    let manager = TaskManager::new(store.clone());

    let task = manager.create("researcher", "dig").await.unwrap();
    manager.mark_running(&task.id).await.unwrap();
    assert_eq!(
        store.load(&task.id).await.unwrap().unwrap().status,
        TaskStatus::Running
    );

    manager.complete(&task.id, "found it").await.unwrap();
    let stored = store.load(&task.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
    assert_eq!(stored.result.as_deref(), Some("found it"));
}

#[tokio::test]
async fn test_complete_emits_event() {
    let manager = manager();
    let mut events = manager.subscribe();

    let task = manager.create("researcher", "dig").await.unwrap();
    manager.mark_running(&task.id).await.unwrap();
    manager.complete(&task.id, "done").await.unwrap();

    match events.recv().await.unwrap() {
        TaskEvent::Completed { task: event_task } => {
            assert_eq!(event_task.id, task.id);
            assert_eq!(event_task.result.as_deref(), Some("done"));
        }
        TaskEvent::Failed { .. } => panic!("expected completion"),
    }
}

#[tokio::test]
async fn test_fail_emits_event() {
    let manager = manager();
    let mut events = manager.subscribe();

    let task = manager.create("researcher", "dig").await.unwrap();
    manager.fail(&task.id, "boom").await.unwrap();

    match events.recv().await.unwrap() {
        TaskEvent::Failed { task: event_task } => {
            assert_eq!(event_task.error.as_deref(), Some("boom"));
        }
        TaskEvent::Completed { .. } => panic!("expected failure"),
    }
}

#[tokio::test]
async fn test_terminal_transitions_rejected() {
    let manager = manager();
    let task = manager.create("researcher", "dig").await.unwrap();
    manager.complete(&task.id, "done").await.unwrap();

    assert!(manager.mark_running(&task.id).await.is_err());
    assert!(manager.fail(&task.id, "late").await.is_err());
}

#[tokio::test]
async fn test_remove_consumes_registration() {
    let manager = manager();
    let task = manager.create("researcher", "dig").await.unwrap();

    assert!(manager.remove(&task.id).await.is_some());
    assert!(!manager.is_registered(&task.id).await);
    assert!(manager.remove(&task.id).await.is_none());
}

#[tokio::test]
async fn test_list_filters() {
    let manager = manager();
    let first = manager.create("researcher", "a").await.unwrap();
    manager.create("coder", "b").await.unwrap();
    manager.mark_running(&first.id).await.unwrap();

    let running = manager
        .list(&TaskFilter {
            status: Some(TaskStatus::Running),
            ..Default::default()
        })
        .await;
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, first.id);
}

#[tokio::test]
async fn test_spawn_runs_to_completion() {
    let manager = manager();
    let mut events = manager.subscribe();

    let task = manager
        .spawn("researcher", "async work", async { Ok("result text".to_string()) })
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Pending);

    match events.recv().await.unwrap() {
        TaskEvent::Completed { task: done } => {
            assert_eq!(done.id, task.id);
            assert_eq!(done.result.as_deref(), Some("result text"));
        }
        TaskEvent::Failed { .. } => panic!("expected completion"),
    }
}

#[tokio::test]
async fn test_spawn_records_failure() {
    let manager = manager();
    let mut events = manager.subscribe();

    manager
        .spawn("researcher", "doomed", async {
            Err(AgentError::new(ErrorCode::Subagent, "child exploded"))
        })
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        TaskEvent::Failed { task } => {
            assert!(task.error.as_deref().unwrap().contains("child exploded"));
        }
        TaskEvent::Completed { .. } => panic!("expected failure"),
    }
}

#[tokio::test]
async fn test_namespaced_store_round_trip() {
    let store = Arc::new(MemoryTaskStore::with_config(TaskStoreConfig::with_namespace(
        "agent-1",
    )));
    let manager = TaskManager::new(store.clone());
    let task = manager.create("researcher", "dig").await.unwrap();

    assert!(store.load(&task.id).await.unwrap().is_some());
}
