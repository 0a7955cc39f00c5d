use super::*;
use futures::StreamExt;
use serde_json::json;
use tandem_protocol::FinishReason;
use tandem_protocol::TokenUsage;

struct FixedDriver;

#[async_trait]
impl ModelDriver for FixedDriver {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
        Ok(GenerateResponse {
            content: vec![
                ContentPart::Text {
                    text: "Hello".to_string(),
                },
                ContentPart::ToolCall {
                    id: "call_1".to_string(),
                    name: "write".to_string(),
                    args: json!({"file_path": "/a"}),
                },
            ],
            usage: TokenUsage::new(7, 4),
            finish_reason: FinishReason::ToolCalls,
        })
    }
}

#[tokio::test]
async fn test_default_stream_synthesis() {
    let driver = FixedDriver;
    let request = GenerateRequest::new(vec![tandem_protocol::Message::user("hi")]);
    let chunks: Vec<_> = driver
        .stream(request)
        .await
        .unwrap()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|c| c.unwrap())
        .collect();

    assert_eq!(chunks.len(), 3);
    assert!(matches!(&chunks[0], StreamChunk::TextDelta { text } if text == "Hello"));
    assert!(
        matches!(&chunks[1], StreamChunk::ToolCall { tool_call_id, .. } if tool_call_id == "call_1")
    );
    assert!(matches!(
        &chunks[2],
        StreamChunk::Finish {
            finish_reason: FinishReason::ToolCalls,
            ..
        }
    ));
}
