//! Summarisation interface and prompt construction.

use async_trait::async_trait;
use tandem_error::Result;
use tandem_protocol::ContentPart;
use tandem_protocol::Message;
use tandem_protocol::MessageContent;

/// Produces a conversation summary.
///
/// The agent implements this by issuing a `generate` call with the
/// summarisation prompt; the manager stays decoupled from the turn executor.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarise the given prompt text.
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Build the summarisation prompt for a compaction set.
///
/// Old tool results beyond the most recent `keep_tool_result_count` are
/// elided so the summary request itself stays within budget.
pub fn build_summary_prompt(compaction_set: &[Message], keep_tool_result_count: usize) -> String {
    let total_tool_results: usize = compaction_set
        .iter()
        .map(count_tool_results)
        .sum();
    let elide_before = total_tool_results.saturating_sub(keep_tool_result_count);

    let mut seen_tool_results = 0usize;
    let mut transcript = String::new();
    for message in compaction_set {
        transcript.push_str(&format!("[{}] ", message.role));
        match &message.content {
            MessageContent::Text(text) => transcript.push_str(text),
            MessageContent::Parts(parts) => {
                for part in parts {
                    match part {
                        ContentPart::Text { text } => transcript.push_str(text),
                        ContentPart::Reasoning { .. } => {}
                        ContentPart::ToolCall { name, args, .. } => {
                            transcript.push_str(&format!("<tool-call {name}: {args}>"));
                        }
                        ContentPart::ToolResult { name, output, .. } => {
                            seen_tool_results += 1;
                            if seen_tool_results <= elide_before {
                                transcript.push_str(&format!("<tool-result {name}: elided>"));
                            } else {
                                transcript.push_str(&format!(
                                    "<tool-result {name}: {}>",
                                    output.render()
                                ));
                            }
                        }
                    }
                }
            }
        }
        transcript.push('\n');
    }

    format!(
        "Summarize the following conversation so it can replace the original \
         messages. Preserve decisions, open questions, file paths, and any \
         state the assistant must remember to continue the work.\n\n{transcript}"
    )
}

fn count_tool_results(message: &Message) -> usize {
    match &message.content {
        MessageContent::Parts(parts) => parts
            .iter()
            .filter(|p| matches!(p, ContentPart::ToolResult { .. }))
            .count(),
        MessageContent::Text(_) => 0,
    }
}

#[cfg(test)]
#[path = "summarizer.test.rs"]
mod tests;
