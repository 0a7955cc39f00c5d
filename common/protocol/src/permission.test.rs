use super::*;

#[test]
fn test_mode_default() {
    assert_eq!(PermissionMode::default(), PermissionMode::Default);
}

#[test]
fn test_mode_predicates() {
    assert!(!PermissionMode::Default.auto_accept_edits());
    assert!(PermissionMode::AcceptEdits.auto_accept_edits());
    assert!(PermissionMode::BypassPermissions.auto_accept_edits());

    assert!(!PermissionMode::Default.is_bypass());
    assert!(PermissionMode::BypassPermissions.is_bypass());

    assert!(PermissionMode::Plan.is_plan());
    assert!(!PermissionMode::AcceptEdits.is_plan());
}

#[test]
fn test_mode_wire_names() {
    assert_eq!(PermissionMode::AcceptEdits.as_str(), "acceptEdits");
    assert_eq!(PermissionMode::BypassPermissions.as_str(), "bypassPermissions");
    assert_eq!(
        serde_json::to_string(&PermissionMode::AcceptEdits).unwrap(),
        "\"acceptEdits\""
    );
}

#[test]
fn test_behavior_default_is_ask() {
    assert_eq!(PermissionBehavior::default(), PermissionBehavior::Ask);
}

#[test]
fn test_behavior_predicates() {
    assert!(PermissionBehavior::Allow.is_allowed());
    assert!(!PermissionBehavior::Ask.is_allowed());
    assert!(PermissionBehavior::Deny.is_denied());
    assert!(PermissionBehavior::Ask.requires_approval());
    assert!(!PermissionBehavior::Allow.requires_approval());
}

#[test]
fn test_serde_round_trip() {
    let mode: PermissionMode = serde_json::from_str("\"plan\"").unwrap();
    assert_eq!(mode, PermissionMode::Plan);

    let behavior: PermissionBehavior = serde_json::from_str("\"deny\"").unwrap();
    assert_eq!(behavior, PermissionBehavior::Deny);
}
