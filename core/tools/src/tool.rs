//! Tool trait definition.

use async_trait::async_trait;
use serde_json::Value;
use tandem_driver::ToolDefinition;
use tandem_protocol::ToolResultOutput;

use crate::context::ToolContext;
use crate::failure::ToolFailure;

/// Output of a successful tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Content in the discriminated `{type, value}` form.
    pub content: ToolResultOutput,
    /// Whether the output represents a tool-level error the model should see.
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a text output.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: ToolResultOutput::text(content),
            is_error: false,
        }
    }

    /// Create a structured JSON output.
    pub fn json(value: Value) -> Self {
        Self {
            content: ToolResultOutput::json(value),
            is_error: false,
        }
    }

    /// Create an error output surfaced to the model.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: ToolResultOutput::text(message),
            is_error: true,
        }
    }
}

/// A tool that can be executed by the agent.
///
/// # Example
///
/// ```ignore
/// use tandem_tools::{Tool, ToolContext, ToolOutput, ToolFailure};
/// use async_trait::async_trait;
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl Tool for EchoTool {
///     fn name(&self) -> &str { "echo" }
///     fn description(&self) -> &str { "Echo the input back" }
///     fn input_schema(&self) -> serde_json::Value {
///         serde_json::json!({
///             "type": "object",
///             "properties": { "text": {"type": "string"} },
///             "required": ["text"]
///         })
///     }
///
///     async fn execute(
///         &self,
///         input: serde_json::Value,
///         _ctx: &mut ToolContext,
///     ) -> Result<ToolOutput, ToolFailure> {
///         Ok(ToolOutput::text(input["text"].as_str().unwrap_or_default()))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Get the tool description.
    fn description(&self) -> &str;

    /// Get the JSON schema for tool input.
    fn input_schema(&self) -> Value;

    /// Whether this tool belongs to the edit family.
    ///
    /// Edit-family tools are auto-allowed in `acceptEdits` permission mode.
    fn is_edit_tool(&self) -> bool {
        false
    }

    /// Execute the tool with the given input.
    ///
    /// May raise an [`crate::InterruptSignal`] via [`ToolFailure`] to pause
    /// the turn for out-of-band data. Ordinary failures use
    /// [`ToolFailure::Error`].
    async fn execute(&self, input: Value, ctx: &mut ToolContext)
    -> Result<ToolOutput, ToolFailure>;

    /// Convert to a tool definition for the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

#[cfg(test)]
#[path = "tool.test.rs"]
mod tests;
