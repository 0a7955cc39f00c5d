//! The agent session event loop.
//!
//! An [`AgentSession`] wraps an agent in a long-lived loop: it idles until a
//! stimulus arrives (a user message or a background task completion), runs a
//! turn, and pushes lifecycle events to the consumer as a stream.

mod output;
mod session;

pub use output::SessionOutput;
pub use session::{AgentSession, SessionAgent};
