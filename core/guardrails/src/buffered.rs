//! Buffered output gate.

use std::sync::Arc;

use tandem_error::AgentError;
use tandem_error::Result;
use tandem_protocol::StreamChunk;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::guardrail::Guardrail;
use crate::guardrail::permission_denied;

/// State of a buffered output gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Chunks are being buffered; nothing has flushed downstream.
    Buffering,
    /// The guardrail passed; buffered chunks were flushed.
    Passed,
    /// The guardrail blocked; buffered chunks were discarded.
    Blocked,
    /// The guardrail itself failed (fail-closed policy only).
    Error,
}

/// Buffers output chunks until the guardrail verdict is known.
///
/// Text chunks accumulate into the checked content. While `Buffering`, no
/// chunk reaches the consumer; `finalize` either flushes everything
/// (`Passed`) or errs the stream (`Blocked`) without flushing. Once blocked,
/// further `add_content` calls are rejected.
pub struct BufferedOutputGuardrail {
    guardrail: Arc<dyn Guardrail>,
    state: BufferState,
    buffer: Vec<StreamChunk>,
    content: String,
    fail_open: bool,
}

impl BufferedOutputGuardrail {
    /// Create a gate in the buffering state.
    pub fn new(guardrail: Arc<dyn Guardrail>) -> Self {
        Self {
            guardrail,
            state: BufferState::Buffering,
            buffer: Vec::new(),
            content: String::new(),
            fail_open: true,
        }
    }

    /// Disable fail-open: a failing guardrail blocks the stream.
    pub fn fail_closed(mut self) -> Self {
        self.fail_open = false;
        self
    }

    /// The current gate state.
    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Buffer one chunk.
    ///
    /// Rejected once the gate has blocked or errored.
    pub fn add_content(&mut self, chunk: StreamChunk) -> Result<()> {
        match self.state {
            BufferState::Buffering | BufferState::Passed => {}
            BufferState::Blocked | BufferState::Error => {
                return Err(AgentError::validation(
                    "output guardrail already blocked this stream",
                ));
            }
        }

        if let StreamChunk::TextDelta { text } = &chunk {
            self.content.push_str(text);
        }
        self.buffer.push(chunk);
        Ok(())
    }

    /// Run the guardrail over the accumulated content.
    ///
    /// On pass, returns the buffered chunks for flushing downstream. On
    /// block, returns the permission-denied error and discards the buffer.
    pub async fn finalize(&mut self, cancel: &CancellationToken) -> Result<Vec<StreamChunk>> {
        let verdict = match self.guardrail.check(&self.content, cancel).await {
            Ok(verdict) => verdict,
            Err(e) if self.fail_open => {
                debug!(error = %e, "Output guardrail failed; passing buffered content");
                crate::guardrail::GuardrailVerdict::pass()
            }
            Err(e) => {
                self.state = BufferState::Error;
                self.buffer.clear();
                return Err(e);
            }
        };

        if verdict.blocked {
            self.state = BufferState::Blocked;
            self.buffer.clear();
            let reason = verdict.reason.as_deref().unwrap_or("blocked");
            return Err(permission_denied(reason, &verdict.blocked_message_ids));
        }

        self.state = BufferState::Passed;
        Ok(std::mem::take(&mut self.buffer))
    }
}

#[cfg(test)]
#[path = "buffered.test.rs"]
mod tests;
