use super::*;

#[test]
fn test_block_accessors() {
    let output = HookOutput::Block {
        reason: "policy violation".to_string(),
    };
    assert!(output.is_block());
    assert_eq!(output.block_reason(), Some("policy violation"));
}

#[test]
fn test_non_block_accessors() {
    assert!(!HookOutput::Continue.is_block());
    assert!(HookOutput::Continue.block_reason().is_none());

    let retry = HookOutput::Retry { retry_delay_ms: 100 };
    assert!(!retry.is_block());
}
