use super::*;
use crate::options::GenerateOptions;
use crate::testing::ScriptStep;
use crate::testing::ScriptedDriver;
use futures::stream;
use serde_json::json;
use tandem_protocol::PermissionMode;
use tandem_tools::builtin::WriteTool;

fn chunk_stream(chunks: Vec<StreamChunk>) -> ChunkStream {
    Box::pin(stream::iter(chunks.into_iter().map(Ok)))
}

#[tokio::test]
async fn test_collect_and_forward_accumulates_text() {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let stream = chunk_stream(vec![
        StreamChunk::TextDelta {
            text: "Hel".to_string(),
        },
        StreamChunk::TextDelta {
            text: "lo".to_string(),
        },
        StreamChunk::Finish {
            finish_reason: FinishReason::Stop,
            total_usage: TokenUsage::new(3, 2),
        },
    ]);

    let response = collect_and_forward(stream, &tx).await.unwrap();
    assert_eq!(response.text(), "Hello");
    assert_eq!(response.usage, TokenUsage::new(3, 2));
    assert_eq!(response.finish_reason, FinishReason::Stop);

    // Text deltas forwarded; the intermediate finish is absorbed.
    drop(tx);
    let mut forwarded = Vec::new();
    while let Some(chunk) = rx.recv().await {
        forwarded.push(chunk.unwrap());
    }
    assert_eq!(forwarded.len(), 2);
    assert!(forwarded
        .iter()
        .all(|c| matches!(c, StreamChunk::TextDelta { .. })));
}

#[tokio::test]
async fn test_collect_and_forward_reasoning_accumulation() {
    let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
    let stream = chunk_stream(vec![
        StreamChunk::ReasoningStart {
            id: "r1".to_string(),
        },
        StreamChunk::ReasoningDelta {
            id: "r1".to_string(),
            text: "thinking ".to_string(),
        },
        StreamChunk::ReasoningDelta {
            id: "r1".to_string(),
            text: "hard".to_string(),
        },
        StreamChunk::ReasoningEnd {
            id: "r1".to_string(),
        },
    ]);

    let response = collect_and_forward(stream, &tx).await.unwrap();
    match &response.content[0] {
        ContentPart::Reasoning { id, text } => {
            assert_eq!(id, "r1");
            assert_eq!(text, "thinking hard");
        }
        other => panic!("expected reasoning part, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stream_tool_result_follows_tool_call() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![
            ScriptStep::ToolCall {
                id: "call_1",
                name: "write",
                args: json!({"file_path": "/t.txt", "content": "x"}),
            },
            ScriptStep::Text("done"),
        ],
    ));
    let agent = Arc::new(
        Agent::builder()
            .model(driver)
            .tool(Arc::new(WriteTool::new()))
            .permission_mode(PermissionMode::BypassPermissions)
            .build()
            .unwrap(),
    );

    let chunks: Vec<StreamChunk> = agent
        .stream(GenerateOptions::prompt("write it"))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(|c| c.unwrap())
        .collect();

    let call_index = chunks
        .iter()
        .position(|c| matches!(c, StreamChunk::ToolCall { tool_call_id, .. } if tool_call_id == "call_1"))
        .unwrap();
    let result_index = chunks
        .iter()
        .position(|c| matches!(c, StreamChunk::ToolResult { tool_call_id, .. } if tool_call_id == "call_1"))
        .unwrap();
    assert!(call_index < result_index);

    // Exactly one finish chunk closes the stream.
    let finishes: Vec<_> = chunks
        .iter()
        .filter(|c| matches!(c, StreamChunk::Finish { .. }))
        .collect();
    assert_eq!(finishes.len(), 1);
    assert!(matches!(chunks.last().unwrap(), StreamChunk::Finish { .. }));
}

#[tokio::test]
async fn test_stream_surfaces_errors_in_stream() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Fail("401 unauthorized")],
    ));
    let agent = Arc::new(Agent::builder().model(driver).build().unwrap());

    let chunks: Vec<_> = agent
        .stream(GenerateOptions::prompt("hi"))
        .collect::<Vec<_>>()
        .await;
    assert!(chunks.iter().any(Result::is_err));
}

#[tokio::test]
async fn test_data_response_variants() {
    let no_content = DataResponse::no_content();
    assert!(no_content.is_no_content());
    assert_eq!(no_content.status, 204);

    let ok = DataResponse::ok(chunk_stream(vec![]));
    assert_eq!(ok.status, 200);
    assert!(!ok.is_no_content());
}

#[tokio::test]
async fn test_stream_guarded_blocks_everything() {
    let driver = Arc::new(ScriptedDriver::new(
        "primary",
        vec![ScriptStep::Text("the forbidden word appears here")],
    ));
    let agent = Arc::new(Agent::builder().model(driver).build().unwrap());

    let guardrail: Arc<dyn tandem_guardrails::Guardrail> = Arc::new(
        tandem_guardrails::FnGuardrail::new("word-filter", |text, _cancel| async move {
            if text.contains("forbidden") {
                Ok(tandem_guardrails::GuardrailVerdict::block("forbidden word"))
            } else {
                Ok(tandem_guardrails::GuardrailVerdict::pass())
            }
        }),
    );

    let results: Vec<_> = agent
        .stream_guarded(GenerateOptions::prompt("go"), guardrail.clone())
        .collect::<Vec<_>>()
        .await;

    // Nothing flushed; the only item is the block error.
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());

    // A clean turn flushes everything in order.
    let driver = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("benign")]));
    let agent = Arc::new(Agent::builder().model(driver).build().unwrap());
    let results: Vec<_> = agent
        .stream_guarded(GenerateOptions::prompt("go"), guardrail)
        .collect::<Vec<_>>()
        .await;
    assert!(results.iter().all(Result::is_ok));
    assert!(results.len() >= 2);
}

#[tokio::test]
async fn test_stream_data_response_callback_error_not_retried() {
    let driver = Arc::new(ScriptedDriver::new("primary", vec![ScriptStep::Text("hi")]));
    let agent = Arc::new(Agent::builder().model(driver.clone()).build().unwrap());

    let err = agent
        .stream_data_response(GenerateOptions::prompt("hi"), |_stream| {
            Err(tandem_error::AgentError::new(
                tandem_error::ErrorCode::RateLimit,
                "creation callback failed",
            ))
        })
        .unwrap_err();

    // Retryable code, yet no retry: the callback runs outside the
    // controller.
    assert_eq!(err.code, tandem_error::ErrorCode::RateLimit);
}
