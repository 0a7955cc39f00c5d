//! The model driver interface consumed by the turn executor.
//!
//! A [`ModelDriver`] wraps one language model provider and exposes `generate`
//! and `stream`. The runtime never talks to a provider directly; everything
//! flows through this trait so tests and fallbacks can swap models freely.

mod request;

pub use request::{GenerateRequest, GenerateResponse, ToolDefinition};

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use futures::stream;
use tandem_error::Result;
use tandem_protocol::ContentPart;
use tandem_protocol::StreamChunk;

/// A boxed stream of chunks from one generation attempt.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

/// A language model provider.
#[async_trait]
pub trait ModelDriver: Send + Sync {
    /// Identifier for logs and fallback transitions.
    fn name(&self) -> &str;

    /// Run one generation to completion.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Run one generation as a chunk stream.
    ///
    /// The default implementation synthesises a stream from [`generate`]:
    /// one `text-delta` for the full text, a `tool-call` per requested
    /// invocation, then `finish`. Providers with native streaming override
    /// this.
    ///
    /// [`generate`]: ModelDriver::generate
    async fn stream(&self, request: GenerateRequest) -> Result<ChunkStream> {
        let response = self.generate(request).await?;
        let mut chunks: Vec<Result<StreamChunk>> = Vec::new();

        for part in &response.content {
            match part {
                ContentPart::Text { text } if !text.is_empty() => {
                    chunks.push(Ok(StreamChunk::TextDelta { text: text.clone() }));
                }
                ContentPart::Reasoning { id, text } => {
                    chunks.push(Ok(StreamChunk::ReasoningStart { id: id.clone() }));
                    chunks.push(Ok(StreamChunk::ReasoningDelta {
                        id: id.clone(),
                        text: text.clone(),
                    }));
                    chunks.push(Ok(StreamChunk::ReasoningEnd { id: id.clone() }));
                }
                ContentPart::ToolCall { id, name, args } => {
                    chunks.push(Ok(StreamChunk::ToolCall {
                        tool_call_id: id.clone(),
                        tool_name: name.clone(),
                        input: args.clone(),
                    }));
                }
                _ => {}
            }
        }

        chunks.push(Ok(StreamChunk::Finish {
            finish_reason: response.finish_reason,
            total_usage: response.usage,
        }));

        Ok(Box::pin(stream::iter(chunks)))
    }
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
