use super::*;

#[test]
fn test_new_task_is_pending() {
    let task = BackgroundTask::new("researcher", "find things");
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.id.starts_with("task_"));
    assert!(task.completed_at.is_none());
}

#[test]
fn test_forward_transitions() {
    let mut task = BackgroundTask::new("researcher", "work");
    assert!(task.transition(TaskStatus::Running));
    assert!(task.transition(TaskStatus::Completed));
    assert!(task.completed_at.is_some());
}

#[test]
fn test_terminal_states_are_sticky() {
    let mut task = BackgroundTask::new("researcher", "work");
    assert!(task.transition(TaskStatus::Failed));
    assert!(!task.transition(TaskStatus::Running));
    assert!(!task.transition(TaskStatus::Completed));
    assert_eq!(task.status, TaskStatus::Failed);
}

#[test]
fn test_no_backward_transition() {
    let mut task = BackgroundTask::new("researcher", "work");
    assert!(task.transition(TaskStatus::Running));
    assert!(!task.transition(TaskStatus::Pending));
}

#[test]
fn test_pending_straight_to_terminal() {
    let mut task = BackgroundTask::new("researcher", "work");
    assert!(task.transition(TaskStatus::Cancelled));
    assert!(task.status.is_terminal());
}

#[test]
fn test_filter_matches() {
    let mut task = BackgroundTask::new("researcher", "work");
    task.transition(TaskStatus::Running);

    let all = TaskFilter::default();
    assert!(all.matches(&task));

    let by_status = TaskFilter {
        status: Some(TaskStatus::Running),
        ..Default::default()
    };
    assert!(by_status.matches(&task));

    let wrong_status = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    assert!(!wrong_status.matches(&task));

    let by_type = TaskFilter {
        subagent_type: Some("researcher".to_string()),
        ..Default::default()
    };
    assert!(by_type.matches(&task));

    let wrong_type = TaskFilter {
        subagent_type: Some("coder".to_string()),
        ..Default::default()
    };
    assert!(!wrong_type.matches(&task));
}

#[test]
fn test_status_serde() {
    assert_eq!(serde_json::to_string(&TaskStatus::Running).unwrap(), "\"running\"");
    let parsed: TaskStatus = serde_json::from_str("\"cancelled\"").unwrap();
    assert_eq!(parsed, TaskStatus::Cancelled);
}
