//! Lifecycle hooks for the agent runtime.
//!
//! A hook is a user-supplied callback invoked at a named lifecycle point; it
//! may short-circuit, transform, or observe. Hooks fire in registration
//! order; `PreGenerate` hooks run sequentially so each sees the output of the
//! previous one.

mod context;
mod event;
mod output;
mod registry;

pub use context::HookContext;
pub use event::HookEvent;
pub use output::HookOutput;
pub use registry::{FnHook, Hook, HookRegistry};
