//! Conversation messages and content parts.
//!
//! A message's content is either an opaque text string or an ordered list of
//! parts. Tool results always use the `{type, value}` discriminated form on
//! the wire; raw objects never appear.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Returns the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of a tool execution as it appears inside a `tool-result` part.
///
/// Always the discriminated `{type, value}` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResultOutput {
    /// Plain text output.
    Text { value: String },
    /// Structured JSON output.
    Json { value: Value },
}

impl ToolResultOutput {
    /// Create a text output.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
        }
    }

    /// Create a structured JSON output.
    pub fn json(value: Value) -> Self {
        Self::Json { value }
    }

    /// The output rendered as a string (for prompts and logs).
    pub fn render(&self) -> String {
        match self {
            Self::Text { value } => value.clone(),
            Self::Json { value } => value.to_string(),
        }
    }
}

/// One element of a structured message content list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    /// Plain text.
    Text { text: String },

    /// A tool invocation requested by the model.
    ToolCall {
        id: String,
        name: String,
        args: Value,
    },

    /// The result of a tool invocation.
    ToolResult {
        id: String,
        name: String,
        output: ToolResultOutput,
    },

    /// Model reasoning content.
    Reasoning { id: String, text: String },
}

/// Message content: opaque text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Concatenated text of all text parts (or the whole string content).
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Total character length of the content (for token estimation).
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    ContentPart::Text { text } => text.len(),
                    ContentPart::Reasoning { text, .. } => text.len(),
                    ContentPart::ToolCall { args, .. } => args.to_string().len(),
                    ContentPart::ToolResult { output, .. } => output.render().len(),
                })
                .sum(),
        }
    }
}

/// A single conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// Create a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant message with plain text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Create an assistant message from structured parts.
    pub fn assistant_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Parts(parts),
        }
    }

    /// Create a tool message carrying one or more tool results.
    pub fn tool_results(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Parts(parts),
        }
    }

    /// The message's text content.
    pub fn text(&self) -> String {
        self.content.text()
    }

    /// Tool calls contained in this message, if any.
    pub fn tool_calls(&self) -> Vec<&ContentPart> {
        match &self.content {
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| matches!(p, ContentPart::ToolCall { .. }))
                .collect(),
            MessageContent::Text(_) => Vec::new(),
        }
    }
}

/// Validate the structural invariants of a conversation.
///
/// - Every `tool-result` references a `tool-call` with the same id appearing
///   earlier in the sequence.
/// - The `system` message, if present, is unique and first.
pub fn validate_conversation(messages: &[Message]) -> Result<(), String> {
    let mut seen_call_ids: Vec<&str> = Vec::new();

    for (index, message) in messages.iter().enumerate() {
        if message.role == Role::System && index != 0 {
            return Err(format!("system message at index {index} is not first"));
        }

        if let MessageContent::Parts(parts) = &message.content {
            for part in parts {
                match part {
                    ContentPart::ToolCall { id, .. } => seen_call_ids.push(id),
                    ContentPart::ToolResult { id, .. } => {
                        if !seen_call_ids.contains(&id.as_str()) {
                            return Err(format!(
                                "tool-result {id} has no preceding tool-call"
                            ));
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "message.test.rs"]
mod tests;
