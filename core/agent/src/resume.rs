//! Interrupt resume: re-entry into a suspended turn.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use serde_json::Value;
use tandem_error::AgentError;
use tandem_error::Result;
use tandem_protocol::ContentPart;
use tandem_protocol::InterruptKind;
use tandem_protocol::Message;
use tandem_protocol::MessageContent;
use tandem_protocol::TokenUsage;
use tandem_protocol::ToolResultOutput;
use tandem_protocol::TurnResult;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::Agent;
use crate::agent::ChunkSender;
use crate::agent::StepOutcome;
use crate::agent::TurnState;

impl Agent {
    /// Deliver the out-of-band response for a pending interrupt and re-enter
    /// the suspended turn.
    ///
    /// Validation failures name the specific reason: missing checkpointer,
    /// missing checkpoint, no pending interrupt, or an id mismatch.
    pub async fn resume(
        &self,
        thread_id: &str,
        interrupt_id: &str,
        response: Value,
    ) -> Result<TurnResult> {
        self.resume_inner(thread_id, interrupt_id, response, None)
            .await
    }

    pub(crate) async fn resume_inner(
        &self,
        thread_id: &str,
        interrupt_id: &str,
        response: Value,
        emitter: Option<&ChunkSender>,
    ) -> Result<TurnResult> {
        let result = self
            .resume_unwrapped(thread_id, interrupt_id, response, emitter)
            .await;
        match result {
            Err(err) if err.metadata_value("threadId").is_none() => {
                Err(err.with_thread_id(thread_id))
            }
            other => other,
        }
    }

    async fn resume_unwrapped(
        &self,
        thread_id: &str,
        interrupt_id: &str,
        response: Value,
        emitter: Option<&ChunkSender>,
    ) -> Result<TurnResult> {
        let checkpointer = self
            .checkpointer
            .clone()
            .ok_or_else(|| AgentError::validation("resume requires a configured checkpointer"))?;

        let lock = self.thread_lock(thread_id);
        let _guard = lock.lock_owned().await;

        let checkpoint = checkpointer.load(thread_id).await?.ok_or_else(|| {
            AgentError::validation(format!("no checkpoint exists for thread {thread_id}"))
        })?;
        let interrupt = checkpoint.pending_interrupt.clone().ok_or_else(|| {
            AgentError::validation(format!("no pending interrupt for thread {thread_id}"))
        })?;
        if interrupt.id != interrupt_id {
            return Err(AgentError::validation(format!(
                "interrupt id mismatch: pending is {}, got {interrupt_id}",
                interrupt.id
            )));
        }

        info!(
            agent_id = %self.id,
            thread_id,
            interrupt_id,
            kind = ?interrupt.kind,
            "Resuming interrupted turn"
        );

        let effective_tools = self.effective_tools();
        let mut messages = Vec::new();
        if let Some(system) = self.resume_system_prompt(&effective_tools) {
            messages.push(Message::system(system));
        }
        messages.extend(checkpoint.messages);

        let mut turn = TurnState {
            thread_id: Some(thread_id.to_string()),
            forked_session_id: None,
            messages,
            state: Arc::new(StdMutex::new(checkpoint.state)),
            usage: TokenUsage::default(),
            steps: 0,
            effective_tools,
            cancel: CancellationToken::new(),
        };

        let args = tool_call_args(&turn.messages, &interrupt.tool_call_id).ok_or_else(|| {
            AgentError::validation(format!(
                "tool call {} not found in checkpoint messages",
                interrupt.tool_call_id
            ))
        })?;

        match interrupt.kind {
            InterruptKind::Approval => {
                let approved = response.get("approved").and_then(Value::as_bool).ok_or_else(
                    || AgentError::validation("approval response requires an 'approved' boolean"),
                )?;

                if approved {
                    // Re-execute with the stored args; the pipeline is not
                    // re-consulted, the user's approval is the decision.
                    match self
                        .execute_tool_unchecked(
                            &mut turn,
                            &interrupt.tool_call_id,
                            &interrupt.tool_name,
                            &args,
                            emitter,
                        )
                        .await?
                    {
                        StepOutcome::Continue => {}
                        StepOutcome::Interrupted(result) => return Ok(result),
                    }
                } else {
                    // Denied: the tool never runs.
                    self.append_tool_result(
                        &mut turn,
                        &interrupt.tool_call_id,
                        &interrupt.tool_name,
                        ToolResultOutput::text(format!(
                            "Tool call {} denied by user",
                            interrupt.tool_name
                        )),
                        emitter,
                    )
                    .await;
                }
            }
            InterruptKind::Custom => {
                // Bind the response under the raw tool call id; the tool's
                // next interrupt() call consumes it exactly once. A further
                // interrupt() raises a fresh signal and the turn suspends
                // again.
                self.responses.bind(interrupt.tool_call_id.clone(), response);
                match self
                    .execute_tool_unchecked(
                        &mut turn,
                        &interrupt.tool_call_id,
                        &interrupt.tool_name,
                        &args,
                        emitter,
                    )
                    .await?
                {
                    StepOutcome::Continue => {}
                    StepOutcome::Interrupted(result) => return Ok(result),
                }
            }
        }

        // Any sibling tool calls from the suspended step run now, through
        // the normal gate path.
        match self.process_pending_tool_calls(&mut turn, emitter).await? {
            StepOutcome::Continue => {}
            StepOutcome::Interrupted(result) => return Ok(result),
        }

        self.run_loop(&mut turn, emitter).await
    }

    fn resume_system_prompt(&self, effective_tools: &[String]) -> Option<String> {
        // Same assembly as a fresh turn: static prompt or builder output.
        if let Some(prompt) = &self.system_prompt {
            return Some(prompt.clone());
        }
        self.prompt_builder.as_ref().map(|builder| {
            builder.build(&crate::prompt::PromptContext {
                tools: effective_tools,
                skills: &self.skills,
                plugins: &self.plugin_names,
                permission_mode: self.permission_mode(),
                delegation_instructions: self.delegation_instructions.as_deref(),
            })
        })
    }
}

/// The recorded args for a tool call id, from the checkpointed messages.
fn tool_call_args(messages: &[Message], tool_call_id: &str) -> Option<Value> {
    messages.iter().rev().find_map(|message| match &message.content {
        MessageContent::Parts(parts) => parts.iter().find_map(|part| match part {
            ContentPart::ToolCall { id, args, .. } if id == tool_call_id => Some(args.clone()),
            _ => None,
        }),
        MessageContent::Text(_) => None,
    })
}

#[cfg(test)]
#[path = "resume.test.rs"]
mod tests;
