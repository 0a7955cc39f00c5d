use super::*;

#[test]
fn test_empty_state() {
    let state = ConversationState::new();
    assert!(state.files.is_empty());
    assert!(state.todos.is_empty());
}

#[test]
fn test_write_file_creates_record() {
    let mut state = ConversationState::new();
    state.write_file("/a.txt", "line one\nline two");

    let record = state.files.get("/a.txt").unwrap();
    assert_eq!(record.lines, vec!["line one", "line two"]);
    assert_eq!(record.created_at, record.modified_at);
    assert_eq!(state.file_content("/a.txt").unwrap(), "line one\nline two");
}

#[test]
fn test_rewrite_preserves_created_at() {
    let mut state = ConversationState::new();
    state.write_file("/a.txt", "v1");
    let created = state.files.get("/a.txt").unwrap().created_at;

    state.write_file("/a.txt", "v2");
    let record = state.files.get("/a.txt").unwrap();
    assert_eq!(record.created_at, created);
    assert_eq!(record.content(), "v2");
}

#[test]
fn test_set_todos_replaces() {
    let mut state = ConversationState::new();
    state.set_todos(vec![TodoItem {
        id: "1".to_string(),
        content: "first".to_string(),
        status: TodoStatus::Pending,
        created_at: chrono::Utc::now(),
        completed_at: None,
    }]);
    assert_eq!(state.todos.len(), 1);

    state.set_todos(Vec::new());
    assert!(state.todos.is_empty());
}

#[test]
fn test_todo_status_serde() {
    assert_eq!(
        serde_json::to_string(&TodoStatus::InProgress).unwrap(),
        "\"in_progress\""
    );
}

#[test]
fn test_state_serde_round_trip() {
    let mut state = ConversationState::new();
    state.write_file("/a.txt", "content");
    let json = serde_json::to_string(&state).unwrap();
    let parsed: ConversationState = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);
}
