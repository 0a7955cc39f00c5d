//! The implicit `task` and `task_output` tools.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tandem_driver::GenerateRequest;
use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_protocol::Message;
use tandem_protocol::TaskStatus;
use tandem_tasks::TaskManager;
use tandem_tools::Tool;
use tandem_tools::ToolContext;
use tandem_tools::ToolFailure;
use tandem_tools::ToolOutput;

use crate::config::SubagentDefinition;

/// The fallback subagent used when no named definition matches.
const GENERAL_PURPOSE: &str = "general-purpose";

/// Tool that fans work out to a subagent as a background task.
pub struct TaskTool {
    manager: Arc<TaskManager>,
    subagents: HashMap<String, SubagentDefinition>,
    driver: Arc<dyn ModelDriver>,
}

impl TaskTool {
    /// Create the task tool.
    pub fn new(
        manager: Arc<TaskManager>,
        subagents: HashMap<String, SubagentDefinition>,
        driver: Arc<dyn ModelDriver>,
    ) -> Self {
        Self {
            manager,
            subagents,
            driver,
        }
    }
}

#[async_trait]
impl Tool for TaskTool {
    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Delegate work to a subagent running in the background"
    }

    fn input_schema(&self) -> Value {
        let mut schema = serde_json::json!({
            "type": "object",
            "properties": {
                "subagent_type": {
                    "type": "string",
                    "description": "Which subagent to delegate to"
                },
                "description": {
                    "type": "string",
                    "description": "The work to hand off"
                }
            },
            "required": ["description"]
        });

        if !self.subagents.is_empty() {
            let mut subagent_names: Vec<&str> =
                self.subagents.keys().map(String::as_str).collect();
            subagent_names.sort_unstable();
            schema["properties"]["subagent_type"]["enum"] = serde_json::json!(subagent_names);
        }
        schema
    }

    async fn execute(
        &self,
        input: Value,
        _ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        let description = input["description"]
            .as_str()
            .ok_or_else(|| AgentError::validation("description must be a string"))?
            .to_string();
        let subagent_type = input["subagent_type"]
            .as_str()
            .unwrap_or(GENERAL_PURPOSE)
            .to_string();

        let definition = self.subagents.get(&subagent_type).cloned();
        if definition.is_none() && subagent_type != GENERAL_PURPOSE {
            return Ok(ToolOutput::error(format!(
                "unknown subagent type: {subagent_type}"
            )));
        }

        let driver = definition
            .as_ref()
            .and_then(|d| d.driver.clone())
            .unwrap_or_else(|| self.driver.clone());
        let system_prompt = definition.map(|d| d.system_prompt);
        let child_prompt = description.clone();

        let task = self
            .manager
            .spawn(subagent_type, description, async move {
                let mut messages = Vec::new();
                if let Some(system) = system_prompt {
                    messages.push(Message::system(system));
                }
                messages.push(Message::user(child_prompt));
                let response = driver.generate(GenerateRequest::new(messages)).await?;
                Ok(response.text())
            })
            .await
            .map_err(ToolFailure::Error)?;

        Ok(ToolOutput::json(serde_json::json!({
            "task_id": task.id,
            "status": task.status.as_str(),
        })))
    }
}

/// Tool that retrieves (and consumes) a background task's output.
pub struct TaskOutputTool {
    manager: Arc<TaskManager>,
}

impl TaskOutputTool {
    /// Create the task-output tool.
    pub fn new(manager: Arc<TaskManager>) -> Self {
        Self { manager }
    }

    fn render(task: &tandem_protocol::BackgroundTask) -> ToolOutput {
        match task.status {
            TaskStatus::Completed => ToolOutput::json(serde_json::json!({
                "task_id": task.id,
                "status": task.status.as_str(),
                "result": task.result,
            })),
            TaskStatus::Failed => ToolOutput::json(serde_json::json!({
                "task_id": task.id,
                "status": task.status.as_str(),
                "error": task.error,
            })),
            _ => ToolOutput::json(serde_json::json!({
                "task_id": task.id,
                "status": task.status.as_str(),
            })),
        }
    }
}

#[async_trait]
impl Tool for TaskOutputTool {
    fn name(&self) -> &str {
        "task_output"
    }

    fn description(&self) -> &str {
        "Get the result of a background task, waiting for completion if asked"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_id": {
                    "type": "string",
                    "description": "The task to read"
                },
                "block": {
                    "type": "boolean",
                    "description": "Whether to wait for completion",
                    "default": true
                },
                "timeout": {
                    "type": "integer",
                    "description": "Max wait time in ms",
                    "default": 30000
                }
            },
            "required": ["task_id"]
        })
    }

    async fn execute(
        &self,
        input: Value,
        _ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        let task_id = input["task_id"]
            .as_str()
            .ok_or_else(|| AgentError::validation("task_id must be a string"))?;
        let block = input["block"].as_bool().unwrap_or(true);
        let timeout_ms = input["timeout"].as_i64().unwrap_or(30_000).max(0) as u64;

        // Subscribe before the first status check so a completion landing in
        // between is not missed.
        let mut events = self.manager.subscribe();

        let Some(task) = self.manager.get(task_id).await else {
            return Ok(ToolOutput::error(format!(
                "Task {task_id} not found. It may have been consumed already."
            )));
        };

        if task.status.is_terminal() {
            // Consuming the result deregisters the task, so the session loop
            // will not announce it a second time.
            self.manager.remove(task_id).await;
            return Ok(Self::render(&task));
        }

        if !block {
            return Ok(Self::render(&task));
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(ToolOutput::error(format!(
                    "Timed out waiting for task {task_id}"
                )));
            }

            match tokio::time::timeout(remaining, events.recv()).await {
                Ok(Ok(event)) if event.task_id() == task_id => {
                    if let Some(task) = self.manager.get(task_id).await {
                        self.manager.remove(task_id).await;
                        return Ok(Self::render(&task));
                    }
                    return Ok(ToolOutput::error(format!(
                        "Task {task_id} not found. It may have been consumed already."
                    )));
                }
                Ok(Ok(_)) => continue,
                Ok(Err(_)) => {
                    return Ok(ToolOutput::error(format!(
                        "Event channel closed while waiting for task {task_id}"
                    )));
                }
                Err(_) => {
                    return Ok(ToolOutput::error(format!(
                        "Timed out waiting for task {task_id}"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "task_tool.test.rs"]
mod tests;
