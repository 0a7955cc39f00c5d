use super::*;
use tandem_protocol::TaskStatus;

#[test]
fn test_key_for_namespacing() {
    let plain = TaskStoreConfig::default();
    assert_eq!(plain.key_for("task_1"), "task_1");

    let namespaced = TaskStoreConfig::with_namespace("agent-a");
    assert_eq!(namespaced.key_for("task_1"), "agent-a:task_1");
}

#[test]
fn test_no_ttl_never_expires() {
    let config = TaskStoreConfig::default();
    let mut task = BackgroundTask::new("researcher", "work");
    task.transition(TaskStatus::Completed);
    assert!(!config.is_expired(&task));
}

#[test]
fn test_active_tasks_never_expire() {
    let config = TaskStoreConfig::with_ttl(std::time::Duration::from_millis(0));
    let mut task = BackgroundTask::new("researcher", "work");
    assert!(!config.is_expired(&task));
    task.transition(TaskStatus::Running);
    assert!(!config.is_expired(&task));
}

#[test]
fn test_terminal_task_expires_after_ttl() {
    let config = TaskStoreConfig::with_ttl(std::time::Duration::from_millis(0));
    let mut task = BackgroundTask::new("researcher", "work");
    task.transition(TaskStatus::Completed);
    // completed_at is in the past relative to a zero TTL check.
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(config.is_expired(&task));
}
