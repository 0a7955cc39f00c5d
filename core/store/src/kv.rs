//! Key-value backend abstraction for store adapters.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tandem_error::Result;
use tokio::sync::RwLock;

/// A minimal string key-value backend.
///
/// Adapters (like [`crate::KvTaskStore`]) layer record semantics on top.
/// Implementations map onto external stores (Redis, sled, DynamoDB) without
/// the runtime caring which.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove a value. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// Keys starting with `prefix`, in lexicographic order.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryKv {
    inner: RwLock<BTreeMap<String, String>>,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.inner.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.inner.write().await.remove(key).is_some())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "kv.test.rs"]
mod tests;
