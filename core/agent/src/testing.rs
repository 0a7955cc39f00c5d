//! Shared test doubles for the agent crate's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tandem_driver::GenerateRequest;
use tandem_driver::GenerateResponse;
use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_error::ErrorCode;
use tandem_error::Result;
use tandem_protocol::ContentPart;
use tandem_protocol::FinishReason;
use tandem_protocol::TokenUsage;

/// One scripted model round-trip.
pub enum ScriptStep {
    /// Respond with plain text.
    Text(&'static str),
    /// Respond with a single tool call.
    ToolCall {
        id: &'static str,
        name: &'static str,
        args: Value,
    },
    /// Fail; the error code is inferred from the message text.
    Fail(&'static str),
}

/// A driver that replays scripted responses and records every request.
pub struct ScriptedDriver {
    name: &'static str,
    script: Mutex<VecDeque<ScriptStep>>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedDriver {
    pub fn new(name: &'static str, steps: Vec<ScriptStep>) -> Self {
        Self {
            name,
            script: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn request(&self, index: usize) -> GenerateRequest {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())[index].clone()
    }
}

#[async_trait]
impl ModelDriver for ScriptedDriver {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let step = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match step {
            Some(ScriptStep::Text(text)) => {
                Ok(GenerateResponse::text_response(text, TokenUsage::new(10, 5)))
            }
            Some(ScriptStep::ToolCall { id, name, args }) => Ok(GenerateResponse {
                content: vec![ContentPart::ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    args,
                }],
                usage: TokenUsage::new(10, 5),
                finish_reason: FinishReason::ToolCalls,
            }),
            Some(ScriptStep::Fail(message)) => {
                Err(AgentError::new(ErrorCode::classify(message), message))
            }
            None => Ok(GenerateResponse::text_response("", TokenUsage::default())),
        }
    }
}
