//! Token counter trait and the default estimator.

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::Digest;
use sha2::Sha256;
use tandem_protocol::Message;

/// Characters-per-token ratio for estimation.
const CHARS_PER_TOKEN: usize = 4;

/// Fixed token overhead added per message (role, framing).
const PER_MESSAGE_OVERHEAD: i64 = 4;

/// Counts tokens for text and messages.
///
/// Implementations must be pure: identical input always yields the same
/// count. The runtime caches per-message counts keyed by content hash, so an
/// impure counter would produce stale results.
pub trait TokenCounter: Send + Sync {
    /// Count tokens in a text chunk.
    fn count(&self, text: &str) -> i64;

    /// Count tokens across a message list, including per-message overhead.
    fn count_messages(&self, messages: &[Message]) -> i64 {
        messages.iter().map(|m| self.count_message(m)).sum()
    }

    /// Count tokens for a single message.
    fn count_message(&self, message: &Message) -> i64 {
        self.count(&canonical_content(message)) + PER_MESSAGE_OVERHEAD
    }

    /// Drop any cached counts.
    fn invalidate_cache(&self) {}
}

/// SHA-256 of a message's canonicalised content.
///
/// The canonical form is the serde JSON serialisation, which is stable for a
/// given message value.
pub fn message_content_hash(message: &Message) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(canonical_content(message).as_bytes());
    hasher.finalize().into()
}

fn canonical_content(message: &Message) -> String {
    serde_json::to_string(message).unwrap_or_default()
}

/// The default byte-ratio estimator with a per-message cache.
pub struct EstimatingCounter {
    per_message_overhead: i64,
    cache: RwLock<HashMap<[u8; 32], i64>>,
}

impl Default for EstimatingCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatingCounter {
    /// Create a counter with default overhead.
    pub fn new() -> Self {
        Self {
            per_message_overhead: PER_MESSAGE_OVERHEAD,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Override the per-message overhead.
    pub fn with_overhead(mut self, overhead: i64) -> Self {
        self.per_message_overhead = overhead;
        self
    }

    #[cfg(test)]
    pub(crate) fn cached_entries(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl TokenCounter for EstimatingCounter {
    fn count(&self, text: &str) -> i64 {
        if text.is_empty() {
            return 0;
        }
        text.len().div_ceil(CHARS_PER_TOKEN) as i64
    }

    fn count_message(&self, message: &Message) -> i64 {
        let hash = message_content_hash(message);
        if let Ok(cache) = self.cache.read() {
            if let Some(&count) = cache.get(&hash) {
                return count;
            }
        }

        let count = self.count(&canonical_content(message)) + self.per_message_overhead;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(hash, count);
        }
        count
    }

    fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

/// Caches per-message counts around any inner counter.
///
/// Useful when the inner counter is expensive (a real tokenizer). The cache
/// key is the message content hash; a cache hit never re-invokes the inner
/// counter.
pub struct CachingCounter<C> {
    inner: C,
    cache: RwLock<HashMap<[u8; 32], i64>>,
}

impl<C: TokenCounter> CachingCounter<C> {
    /// Wrap an inner counter.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Access the inner counter.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: TokenCounter> TokenCounter for CachingCounter<C> {
    fn count(&self, text: &str) -> i64 {
        self.inner.count(text)
    }

    fn count_message(&self, message: &Message) -> i64 {
        let hash = message_content_hash(message);
        if let Ok(cache) = self.cache.read() {
            if let Some(&count) = cache.get(&hash) {
                return count;
            }
        }

        let count = self.inner.count_message(message);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(hash, count);
        }
        count
    }

    fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        self.inner.invalidate_cache();
    }
}

#[cfg(test)]
#[path = "counter.test.rs"]
mod tests;
