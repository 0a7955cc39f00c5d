use super::*;

#[test]
fn test_content_hash_is_hex_sha256() {
    let hash = content_hash("hello");
    assert_eq!(hash.len(), 64);
    assert_eq!(
        hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_approve_then_check() {
    let store = ApprovalStore::new();
    assert!(!store.is_approved("/a.txt", "content"));

    store.approve("/a.txt", "content", Some("reviewer".to_string()));
    assert!(store.is_approved("/a.txt", "content"));
}

#[test]
fn test_hash_mismatch_invalidates() {
    let store = ApprovalStore::new();
    store.approve("/a.txt", "version one", None);
    assert!(store.is_approved("/a.txt", "version one"));
    // Content changed after approval: the approval no longer applies.
    assert!(!store.is_approved("/a.txt", "version two"));
}

#[test]
fn test_revoke() {
    let store = ApprovalStore::new();
    store.approve("/a.txt", "content", None);
    assert!(store.revoke("/a.txt"));
    assert!(!store.revoke("/a.txt"));
    assert!(!store.is_approved("/a.txt", "content"));
}

#[test]
fn test_round_trip_through_records() {
    let store = ApprovalStore::new();
    store.approve("/a.txt", "content", Some("reviewer".to_string()));
    store.approve("/b.txt", "other", None);

    let records = store.records();
    assert_eq!(records.len(), 2);

    let restored = ApprovalStore::from_records(records);
    assert!(restored.is_approved("/a.txt", "content"));
    assert!(restored.is_approved("/b.txt", "other"));
    assert!(!restored.is_approved("/a.txt", "tampered"));
}
