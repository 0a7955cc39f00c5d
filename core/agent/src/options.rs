//! Per-turn generation options.

use tandem_protocol::Message;
use tokio_util::sync::CancellationToken;

/// Options for one `generate` or `stream` call.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// The user prompt for this turn.
    pub prompt: Option<String>,

    /// Explicit messages for this turn (alternative to `prompt`).
    pub messages: Option<Vec<Message>>,

    /// Thread to load and persist against.
    pub thread_id: Option<String>,

    /// Copy the thread's history into this new thread id and run against it.
    pub fork_session: Option<String>,

    /// Per-turn cancellation token.
    pub cancel: CancellationToken,
}

impl GenerateOptions {
    /// Options for a prompt-driven turn.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            prompt: Some(text.into()),
            ..Default::default()
        }
    }

    /// Options for a message-driven turn.
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Some(messages),
            ..Default::default()
        }
    }

    /// Run against a thread.
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Fork the thread into a new session id before running.
    pub fn with_fork_session(mut self, new_id: impl Into<String>) -> Self {
        self.fork_session = Some(new_id.into());
        self
    }

    /// Use an external cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
