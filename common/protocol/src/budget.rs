//! Token budget snapshot for the context window.

use serde::Deserialize;
use serde::Serialize;

/// A snapshot of context-window consumption.
///
/// `is_actual` is true iff `current_tokens` came from a model-reported usage
/// record rather than an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub max_tokens: i64,
    pub current_tokens: i64,
    pub is_actual: bool,
}

impl TokenBudget {
    /// Build a budget snapshot.
    pub fn new(max_tokens: i64, current_tokens: i64, is_actual: bool) -> Self {
        Self {
            max_tokens,
            current_tokens,
            is_actual,
        }
    }

    /// Fraction of the window consumed, in `[0, ∞)`.
    pub fn usage(&self) -> f64 {
        if self.max_tokens <= 0 {
            return 0.0;
        }
        self.current_tokens as f64 / self.max_tokens as f64
    }

    /// Tokens remaining before the window is full (never negative).
    pub fn remaining(&self) -> i64 {
        (self.max_tokens - self.current_tokens).max(0)
    }
}

#[cfg(test)]
#[path = "budget.test.rs"]
mod tests;
