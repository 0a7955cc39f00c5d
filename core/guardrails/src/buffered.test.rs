use super::*;
use crate::guardrail::FnGuardrail;
use crate::guardrail::GuardrailVerdict;

fn text_chunk(text: &str) -> StreamChunk {
    StreamChunk::TextDelta {
        text: text.to_string(),
    }
}

fn blocking_on(word: &'static str) -> Arc<dyn Guardrail> {
    Arc::new(FnGuardrail::new("word-filter", move |text, _cancel| async move {
        if text.contains(word) {
            Ok(GuardrailVerdict::block("disallowed word"))
        } else {
            Ok(GuardrailVerdict::pass())
        }
    }))
}

#[tokio::test]
async fn test_pass_flushes_buffer_in_order() {
    let mut gate = BufferedOutputGuardrail::new(blocking_on("xyzzy"));
    assert_eq!(gate.state(), BufferState::Buffering);

    gate.add_content(text_chunk("hello ")).unwrap();
    gate.add_content(text_chunk("world")).unwrap();

    let flushed = gate.finalize(&CancellationToken::new()).await.unwrap();
    assert_eq!(gate.state(), BufferState::Passed);
    assert_eq!(flushed.len(), 2);
    assert!(matches!(&flushed[0], StreamChunk::TextDelta { text } if text == "hello "));
}

#[tokio::test]
async fn test_block_discards_buffer() {
    let mut gate = BufferedOutputGuardrail::new(blocking_on("xyzzy"));
    gate.add_content(text_chunk("contains xyzzy here")).unwrap();

    let err = gate.finalize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(gate.state(), BufferState::Blocked);
    assert!(err.message.contains("disallowed word"));
}

#[tokio::test]
async fn test_add_content_rejected_after_block() {
    let mut gate = BufferedOutputGuardrail::new(blocking_on("bad"));
    gate.add_content(text_chunk("bad content")).unwrap();
    let _ = gate.finalize(&CancellationToken::new()).await;

    assert!(gate.add_content(text_chunk("more")).is_err());
}

#[tokio::test]
async fn test_non_text_chunks_buffer_without_affecting_content() {
    let mut gate = BufferedOutputGuardrail::new(blocking_on("xyzzy"));
    gate.add_content(StreamChunk::ReasoningStart {
        id: "r1".to_string(),
    })
    .unwrap();
    gate.add_content(text_chunk("fine")).unwrap();

    let flushed = gate.finalize(&CancellationToken::new()).await.unwrap();
    assert_eq!(flushed.len(), 2);
}

#[tokio::test]
async fn test_guardrail_error_fails_open_by_default() {
    let failing: Arc<dyn Guardrail> = Arc::new(FnGuardrail::new("broken", |_text, _cancel| async {
        Err(tandem_error::AgentError::validation("crashed"))
    }));

    let mut gate = BufferedOutputGuardrail::new(failing.clone());
    gate.add_content(text_chunk("content")).unwrap();
    let flushed = gate.finalize(&CancellationToken::new()).await.unwrap();
    assert_eq!(gate.state(), BufferState::Passed);
    assert_eq!(flushed.len(), 1);

    // Fail-closed: the error surfaces and the gate errors out.
    let mut gate = BufferedOutputGuardrail::new(failing).fail_closed();
    gate.add_content(text_chunk("content")).unwrap();
    assert!(gate.finalize(&CancellationToken::new()).await.is_err());
    assert_eq!(gate.state(), BufferState::Error);
}
