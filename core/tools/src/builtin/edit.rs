//! Edit tool: exact string replacement in a tracked file.

use async_trait::async_trait;
use serde_json::Value;
use tandem_error::AgentError;

use crate::context::ToolContext;
use crate::failure::ToolFailure;
use crate::tool::Tool;
use crate::tool::ToolOutput;

/// Tool that performs exact string replacement on a tracked file.
pub struct EditTool;

impl EditTool {
    /// Create a new edit tool.
    pub fn new() -> Self {
        Self
    }
}

impl Default for EditTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Replace an exact string in a previously written file"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path of the file to edit"
                },
                "old_string": {
                    "type": "string",
                    "description": "Exact text to replace"
                },
                "new_string": {
                    "type": "string",
                    "description": "Replacement text"
                },
                "replace_all": {
                    "type": "boolean",
                    "description": "Replace every occurrence instead of requiring a unique match",
                    "default": false
                }
            },
            "required": ["file_path", "old_string", "new_string"]
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
        let old_string = input["old_string"]
            .as_str()
            .ok_or_else(|| AgentError::validation("old_string must be a string"))?;
        let new_string = input["new_string"]
            .as_str()
            .ok_or_else(|| AgentError::validation("new_string must be a string"))?;
        let replace_all = input["replace_all"].as_bool().unwrap_or(false);

        let result = ctx.with_state(|state| {
            let Some(content) = state.file_content(file_path) else {
                return Err(format!("File not found: {file_path}"));
            };

            let occurrences = content.matches(old_string).count();
            if occurrences == 0 {
                return Err(format!("old_string not found in {file_path}"));
            }
            if occurrences > 1 && !replace_all {
                return Err(format!(
                    "old_string matches {occurrences} locations in {file_path}; pass replace_all or disambiguate"
                ));
            }

            let updated = if replace_all {
                content.replace(old_string, new_string)
            } else {
                content.replacen(old_string, new_string, 1)
            };
            state.write_file(file_path, &updated);
            Ok(occurrences)
        });

        match result {
            Ok(replaced) => Ok(ToolOutput::json(serde_json::json!({
                "file_path": file_path,
                "replaced": replaced,
            }))),
            Err(message) => Ok(ToolOutput::error(message)),
        }
    }
}

#[cfg(test)]
#[path = "edit.test.rs"]
mod tests;
