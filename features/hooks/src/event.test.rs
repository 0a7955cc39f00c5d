use super::*;

#[test]
fn test_as_str() {
    assert_eq!(HookEvent::PreGenerate.as_str(), "pre_generate");
    assert_eq!(HookEvent::PostGenerateFailure.as_str(), "post_generate_failure");
    assert_eq!(HookEvent::PreToolUse.as_str(), "pre_tool_use");
    assert_eq!(HookEvent::PostCompact.as_str(), "post_compact");
}

#[test]
fn test_display_matches_as_str() {
    assert_eq!(HookEvent::PreCompact.to_string(), "pre_compact");
}

#[test]
fn test_serde() {
    assert_eq!(
        serde_json::to_string(&HookEvent::PostToolUseFailure).unwrap(),
        "\"post_tool_use_failure\""
    );
    let parsed: HookEvent = serde_json::from_str("\"pre_generate\"").unwrap();
    assert_eq!(parsed, HookEvent::PreGenerate);
}
