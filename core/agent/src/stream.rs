//! Streaming surface and transport-level responses.

use std::sync::Arc;

use futures::StreamExt;
use tandem_driver::ChunkStream;
use tandem_driver::GenerateResponse;
use tandem_error::Result;
use tandem_guardrails::BufferedOutputGuardrail;
use tandem_guardrails::Guardrail;
use tandem_protocol::ContentPart;
use tandem_protocol::FinishReason;
use tandem_protocol::StreamChunk;
use tandem_protocol::TokenUsage;
use tandem_protocol::TurnResult;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::agent::Agent;
use crate::agent::ChunkSender;
use crate::options::GenerateOptions;

/// A transport-level response: a status code and an optional chunk body.
///
/// `204` carries no body (a resume that re-interrupted); `200` streams
/// chunks.
pub struct DataResponse {
    pub status: u16,
    pub body: Option<ChunkStream>,
}

impl std::fmt::Debug for DataResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataResponse")
            .field("status", &self.status)
            .field("body", &self.body.as_ref().map(|_| "ChunkStream"))
            .finish()
    }
}

impl DataResponse {
    /// A 200 response with a streaming body.
    pub fn ok(body: ChunkStream) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    /// A 204 response with no body.
    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// Whether this is the no-body variant.
    pub fn is_no_content(&self) -> bool {
        self.status == 204 && self.body.is_none()
    }
}

impl Agent {
    /// Run a turn as a chunk stream.
    ///
    /// Model chunks are forwarded in arrival order; each tool invocation
    /// appears as its `tool-call` chunk followed (after execution) by a
    /// `tool-result` chunk. One `finish` chunk closes the turn with total
    /// usage. Errors arrive in-stream.
    pub fn stream(self: &Arc<Self>, options: GenerateOptions) -> ChunkStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let agent = self.clone();
        tokio::spawn(async move {
            if let Err(e) = agent.generate_inner(options, Some(tx.clone())).await {
                let _ = tx.send(Err(e));
            }
        });
        Box::pin(UnboundedReceiverStream::new(rx))
    }

    /// The raw chunk stream (alias for [`stream`](Self::stream)).
    pub fn stream_raw(self: &Arc<Self>, options: GenerateOptions) -> ChunkStream {
        self.stream(options)
    }

    /// Run a turn to completion while forwarding chunks to `emitter`.
    ///
    /// Unlike [`stream`](Self::stream) the final [`TurnResult`] is returned
    /// directly; the session loop uses this to interleave chunk events with
    /// its own lifecycle events.
    pub async fn generate_streamed(
        &self,
        options: GenerateOptions,
        emitter: tokio::sync::mpsc::UnboundedSender<Result<StreamChunk>>,
    ) -> Result<TurnResult> {
        self.generate_inner(options, Some(emitter)).await
    }

    /// A transport response wrapping the chunk stream.
    pub fn stream_response(self: &Arc<Self>, options: GenerateOptions) -> DataResponse {
        DataResponse::ok(self.stream(options))
    }

    /// Run a turn behind an output guardrail.
    ///
    /// Chunks are buffered while the turn runs; once the stream ends the
    /// guardrail checks the accumulated text. On pass everything flushes in
    /// order; on block nothing flushes and the stream errs.
    pub fn stream_guarded(
        self: &Arc<Self>,
        options: GenerateOptions,
        guardrail: Arc<dyn Guardrail>,
    ) -> ChunkStream {
        let cancel = options.cancel.clone();
        let mut inner = self.stream(options);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut gate = BufferedOutputGuardrail::new(guardrail);
            while let Some(chunk) = inner.next().await {
                let buffered = match chunk {
                    Ok(chunk) => gate.add_content(chunk),
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                if let Err(e) = buffered {
                    let _ = tx.send(Err(e));
                    return;
                }
            }

            match gate.finalize(&cancel).await {
                Ok(chunks) => {
                    for chunk in chunks {
                        let _ = tx.send(Ok(chunk));
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }

    /// A transport response built by a caller-supplied stream-creation
    /// callback.
    ///
    /// Errors raised inside `create` are returned directly: the callback
    /// runs outside the retry/fallback controller, so they are never
    /// retried. This is a documented limitation of the data-response
    /// surface.
    pub fn stream_data_response<F>(
        self: &Arc<Self>,
        options: GenerateOptions,
        create: F,
    ) -> Result<DataResponse>
    where
        F: FnOnce(ChunkStream) -> Result<ChunkStream>,
    {
        let body = create(self.stream(options))?;
        Ok(DataResponse::ok(body))
    }

    /// Resume an interrupted thread as a transport response.
    ///
    /// Follows the same state machine as [`Agent::resume`]: a re-interrupt
    /// produces a 204 with no body (there is no stream to emit), otherwise
    /// the buffered turn chunks stream back with a 200.
    pub async fn resume_data_response(
        self: &Arc<Self>,
        thread_id: &str,
        interrupt_id: &str,
        response: serde_json::Value,
    ) -> Result<DataResponse> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let result = self
            .resume_inner(thread_id, interrupt_id, response, Some(&tx))
            .await?;
        drop(tx);

        match result {
            TurnResult::Interrupted { .. } => Ok(DataResponse::no_content()),
            TurnResult::Complete { .. } => {
                Ok(DataResponse::ok(Box::pin(UnboundedReceiverStream::new(rx))))
            }
        }
    }
}

/// Drain a driver stream, forwarding chunks downstream while collecting them
/// into a [`GenerateResponse`].
///
/// Intermediate `finish` chunks are absorbed; the turn emits a single final
/// `finish` with total usage. Reasoning deltas are accumulated per block id.
pub(crate) async fn collect_and_forward(
    mut stream: ChunkStream,
    emitter: &ChunkSender,
) -> Result<GenerateResponse> {
    let mut content: Vec<ContentPart> = Vec::new();
    let mut usage = TokenUsage::default();
    let mut finish_reason = FinishReason::Stop;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        match &chunk {
            StreamChunk::TextDelta { text } => {
                if let Some(ContentPart::Text { text: existing }) = content.last_mut() {
                    existing.push_str(text);
                } else {
                    content.push(ContentPart::Text { text: text.clone() });
                }
            }
            StreamChunk::ToolCall {
                tool_call_id,
                tool_name,
                input,
            } => {
                content.push(ContentPart::ToolCall {
                    id: tool_call_id.clone(),
                    name: tool_name.clone(),
                    args: input.clone(),
                });
            }
            StreamChunk::ReasoningStart { id } => {
                content.push(ContentPart::Reasoning {
                    id: id.clone(),
                    text: String::new(),
                });
            }
            StreamChunk::ReasoningDelta { id, text } => {
                let existing = content.iter_mut().find_map(|p| match p {
                    ContentPart::Reasoning { id: part_id, text } if part_id == id => Some(text),
                    _ => None,
                });
                match existing {
                    Some(existing) => existing.push_str(text),
                    None => content.push(ContentPart::Reasoning {
                        id: id.clone(),
                        text: text.clone(),
                    }),
                }
            }
            StreamChunk::Finish {
                finish_reason: reason,
                total_usage,
            } => {
                finish_reason = *reason;
                usage = *total_usage;
                // Absorbed: the turn emits its own final finish chunk.
                continue;
            }
            StreamChunk::ReasoningEnd { .. } | StreamChunk::ToolResult { .. } => {}
        }
        let _ = emitter.send(Ok(chunk));
    }

    Ok(GenerateResponse {
        content,
        usage,
        finish_reason,
    })
}

#[cfg(test)]
#[path = "stream.test.rs"]
mod tests;
