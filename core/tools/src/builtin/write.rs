//! Write tool: create or replace a tracked file.

use async_trait::async_trait;
use serde_json::Value;
use tandem_error::AgentError;

use crate::context::ToolContext;
use crate::failure::ToolFailure;
use crate::tool::Tool;
use crate::tool::ToolOutput;

/// Tool that writes full file content into the conversation state.
pub struct WriteTool;

impl WriteTool {
    /// Create a new write tool.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WriteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteTool {
    fn name(&self) -> &str {
        "write"
    }

    fn description(&self) -> &str {
        "Write full content to a file, creating or replacing it"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path of the file to write"
                },
                "content": {
                    "type": "string",
                    "description": "Full file content"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    fn is_edit_tool(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        input: Value,
        ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        let file_path = input["file_path"]
            .as_str()
            .ok_or_else(|| AgentError::validation("file_path must be a string"))?;
        let content = input["content"]
            .as_str()
            .ok_or_else(|| AgentError::validation("content must be a string"))?;

        let line_count = ctx.with_state(|state| {
            state.write_file(file_path, content);
            state.files[file_path].lines.len()
        });

        Ok(ToolOutput::json(serde_json::json!({
            "file_path": file_path,
            "lines": line_count,
        })))
    }
}

#[cfg(test)]
#[path = "write.test.rs"]
mod tests;
