//! Conversation-scoped mutable state.
//!
//! Created empty with the thread, mutated only by tool executions, destroyed
//! with the thread.

use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Status of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    /// Returns the string representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A single todo item in the conversation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// A versioned record of a file the conversation has touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub lines: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a record from full file content.
    pub fn new(content: &str) -> Self {
        let now = Utc::now();
        Self {
            lines: content.lines().map(str::to_string).collect(),
            created_at: now,
            modified_at: now,
        }
    }

    /// The record's content as a single string.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }
}

/// Mutable per-thread conversation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// File path -> record for files written or edited during the thread.
    #[serde(default)]
    pub files: BTreeMap<String, FileRecord>,

    /// Ordered todo list.
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

impl ConversationState {
    /// Create empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a full file write, creating or replacing the record.
    pub fn write_file(&mut self, path: impl Into<String>, content: &str) {
        let path = path.into();
        match self.files.get_mut(&path) {
            Some(record) => {
                record.lines = content.lines().map(str::to_string).collect();
                record.modified_at = Utc::now();
            }
            None => {
                self.files.insert(path, FileRecord::new(content));
            }
        }
    }

    /// A file's current content, if tracked.
    pub fn file_content(&self, path: &str) -> Option<String> {
        self.files.get(path).map(FileRecord::content)
    }

    /// Replace the todo list atomically.
    pub fn set_todos(&mut self, todos: Vec<TodoItem>) {
        self.todos = todos;
    }
}

#[cfg(test)]
#[path = "state.test.rs"]
mod tests;
