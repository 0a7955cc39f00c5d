//! Tool interface, registry, and builtin tools.
//!
//! Tools are the agent's external capabilities. Each implements [`Tool`] and
//! executes against a [`ToolContext`] that exposes the conversation state and
//! the interrupt channel. A tool that needs out-of-band data raises an
//! [`InterruptSignal`] through [`ToolFailure`]; the turn executor persists it
//! and resumes the tool later.

pub mod builtin;
mod context;
mod failure;
mod registry;
mod tool;

pub use context::{InterruptResponses, ToolContext};
pub use failure::{InterruptSignal, ToolFailure};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};
