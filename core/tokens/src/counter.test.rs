use super::*;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tandem_protocol::Message;

#[test]
fn test_count_empty_is_zero() {
    let counter = EstimatingCounter::new();
    assert_eq!(counter.count(""), 0);
}

#[test]
fn test_count_is_ceil_len_over_four() {
    let counter = EstimatingCounter::new();
    assert_eq!(counter.count("abcd"), 1);
    assert_eq!(counter.count("abcde"), 2);
    assert_eq!(counter.count("abcdefgh"), 2);
}

#[test]
fn test_count_messages_includes_overhead() {
    let counter = EstimatingCounter::new();
    let messages = vec![Message::user("hi")];
    let count = counter.count_messages(&messages);
    // Canonical JSON is longer than the raw text; overhead is additive.
    assert!(count > 4);
}

#[test]
fn test_identical_input_identical_count() {
    let counter = EstimatingCounter::new();
    let messages = vec![Message::user("hello"), Message::assistant("world")];
    let first = counter.count_messages(&messages);
    let second = counter.count_messages(&messages);
    assert_eq!(first, second);
}

#[test]
fn test_cache_populates_per_message() {
    let counter = EstimatingCounter::new();
    let messages = vec![Message::user("a"), Message::user("b")];
    counter.count_messages(&messages);
    assert_eq!(counter.cached_entries(), 2);

    counter.invalidate_cache();
    assert_eq!(counter.cached_entries(), 0);
}

#[test]
fn test_content_hash_is_stable_and_distinct() {
    let a1 = message_content_hash(&Message::user("same"));
    let a2 = message_content_hash(&Message::user("same"));
    let b = message_content_hash(&Message::user("different"));
    assert_eq!(a1, a2);
    assert_ne!(a1, b);
}

struct CountingInner {
    calls: AtomicUsize,
}

impl TokenCounter for CountingInner {
    fn count(&self, text: &str) -> i64 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        text.len() as i64
    }
}

#[test]
fn test_caching_counter_skips_inner_on_hit() {
    let counter = CachingCounter::new(CountingInner {
        calls: AtomicUsize::new(0),
    });
    let messages = vec![Message::user("hello")];

    counter.count_messages(&messages);
    let after_first = counter.inner().calls.load(Ordering::SeqCst);
    assert!(after_first > 0);

    counter.count_messages(&messages);
    let after_second = counter.inner().calls.load(Ordering::SeqCst);
    assert_eq!(after_first, after_second);
}

#[test]
fn test_caching_counter_invalidate_reaches_inner_cache() {
    let counter = CachingCounter::new(CountingInner {
        calls: AtomicUsize::new(0),
    });
    let messages = vec![Message::user("hello")];

    counter.count_messages(&messages);
    counter.invalidate_cache();
    counter.count_messages(&messages);

    // Two cold passes, each invoking the inner counter.
    assert!(counter.inner().calls.load(Ordering::SeqCst) >= 2);
}
