//! Todo tool: atomically replace the conversation's task list.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tandem_error::AgentError;
use tandem_protocol::TodoItem;
use tandem_protocol::TodoStatus;

use crate::context::ToolContext;
use crate::failure::ToolFailure;
use crate::tool::Tool;
use crate::tool::ToolOutput;

/// Tool for creating and managing a structured task list.
///
/// Replaces the entire list atomically. Enforces at most one in-progress item.
pub struct TodoWriteTool;

impl TodoWriteTool {
    /// Create a new todo tool.
    pub fn new() -> Self {
        Self
    }
}

impl Default for TodoWriteTool {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_status(raw: &str) -> Option<TodoStatus> {
    match raw {
        "pending" => Some(TodoStatus::Pending),
        "in_progress" => Some(TodoStatus::InProgress),
        "completed" => Some(TodoStatus::Completed),
        "cancelled" => Some(TodoStatus::Cancelled),
        _ => None,
    }
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn name(&self) -> &str {
        "todo_write"
    }

    fn description(&self) -> &str {
        "Replace the current task list with the supplied items"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "description": "The full list of tasks",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "string",
                                "description": "Unique task identifier (auto-generated if omitted)"
                            },
                            "content": {
                                "type": "string",
                                "description": "What needs to be done"
                            },
                            "status": {
                                "type": "string",
                                "enum": ["pending", "in_progress", "completed", "cancelled"],
                                "description": "Task status"
                            }
                        },
                        "required": ["content", "status"]
                    }
                }
            },
            "required": ["todos"]
        })
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        let todos = input["todos"]
            .as_array()
            .ok_or_else(|| AgentError::validation("todos must be an array"))?;

        let in_progress = todos
            .iter()
            .filter(|t| t["status"].as_str() == Some("in_progress"))
            .count();
        if in_progress > 1 {
            return Ok(ToolOutput::error(
                "At most 1 task can be in_progress at a time",
            ));
        }

        let mut items = Vec::with_capacity(todos.len());
        for (index, todo) in todos.iter().enumerate() {
            let content = todo["content"]
                .as_str()
                .ok_or_else(|| AgentError::validation(format!("todos[{index}].content must be a string")))?;
            let status = todo["status"]
                .as_str()
                .and_then(parse_status)
                .ok_or_else(|| AgentError::validation(format!("todos[{index}].status is invalid")))?;

            let id = todo["id"]
                .as_str()
                .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

            items.push(TodoItem {
                id,
                content: content.to_string(),
                status,
                created_at: Utc::now(),
                completed_at: matches!(status, TodoStatus::Completed).then(Utc::now),
            });
        }

        let count = items.len();
        ctx.with_state(|state| state.set_todos(items));

        Ok(ToolOutput::json(serde_json::json!({ "count": count })))
    }
}

#[cfg(test)]
#[path = "todo_write.test.rs"]
mod tests;
