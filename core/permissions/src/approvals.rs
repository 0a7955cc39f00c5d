//! Content-hash approval persistence.
//!
//! An approval covers a `(path, content)` pair: the stored record keeps the
//! SHA-256 of the canonicalised content, and any mismatch on the same path
//! invalidates the approval (the content changed since the user approved it).

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use tracing::debug;

/// Hex SHA-256 of content.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// A persisted approval for one path at one content version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub path: String,
    pub content_hash: String,
    pub approved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// Store of content-hash approvals keyed by path.
#[derive(Default)]
pub struct ApprovalStore {
    records: RwLock<HashMap<String, ApprovalRecord>>,
}

impl ApprovalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an approval for a path at its current content.
    pub fn approve(&self, path: impl Into<String>, content: &str, approved_by: Option<String>) {
        let path = path.into();
        let record = ApprovalRecord {
            path: path.clone(),
            content_hash: content_hash(content),
            approved_at: Utc::now(),
            approved_by,
        };
        debug!(path = %path, "Recorded approval");
        if let Ok(mut records) = self.records.write() {
            records.insert(path, record);
        }
    }

    /// Whether the path is approved at exactly this content.
    ///
    /// A hash mismatch means the content changed after approval; the stale
    /// approval does not carry over.
    pub fn is_approved(&self, path: &str, content: &str) -> bool {
        self.records
            .read()
            .ok()
            .and_then(|records| records.get(path).map(|r| r.content_hash.clone()))
            .is_some_and(|stored| stored == content_hash(content))
    }

    /// Remove an approval. Returns whether one existed.
    pub fn revoke(&self, path: &str) -> bool {
        self.records
            .write()
            .map(|mut records| records.remove(path).is_some())
            .unwrap_or(false)
    }

    /// All current records (for persistence).
    pub fn records(&self) -> Vec<ApprovalRecord> {
        self.records
            .read()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Rebuild a store from persisted records.
    pub fn from_records(records: Vec<ApprovalRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.records.write() {
            for record in records {
                inner.insert(record.path.clone(), record);
            }
        }
        store
    }
}

#[cfg(test)]
#[path = "approvals.test.rs"]
mod tests;
