use super::*;

#[test]
fn test_verdict_constructors() {
    let pass = GuardrailVerdict::pass();
    assert!(!pass.blocked);
    assert!(pass.reason.is_none());

    let block = GuardrailVerdict::block("profanity")
        .with_blocked_message_ids(vec!["m1".to_string()]);
    assert!(block.blocked);
    assert_eq!(block.reason.as_deref(), Some("profanity"));
    assert_eq!(block.blocked_message_ids, vec!["m1"]);
}

#[test]
fn test_permission_denied_error_shape() {
    let err = permission_denied("bad content", &["m1".to_string(), "m2".to_string()]);
    assert_eq!(err.code, ErrorCode::Authorization);
    assert!(err.message.contains("bad content"));
    let ids = err.metadata_value("blockedMessageIds").unwrap();
    assert_eq!(ids, &serde_json::json!(["m1", "m2"]));
}

#[test]
fn test_permission_denied_without_ids() {
    let err = permission_denied("blocked", &[]);
    assert!(err.metadata_value("blockedMessageIds").is_none());
}

#[tokio::test]
async fn test_fn_guardrail() {
    let guardrail = FnGuardrail::new("no-secrets", |text, _cancel| async move {
        if text.contains("secret") {
            Ok(GuardrailVerdict::block("contains a secret"))
        } else {
            Ok(GuardrailVerdict::pass())
        }
    });

    let cancel = CancellationToken::new();
    assert!(!guardrail.check("hello", &cancel).await.unwrap().blocked);
    assert!(guardrail.check("the secret", &cancel).await.unwrap().blocked);
    assert_eq!(guardrail.name(), "no-secrets");
}
