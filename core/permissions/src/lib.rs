//! The tool permission pipeline.
//!
//! Every tool invocation passes through four gates before execution: the
//! static filter, the permission-mode gate, the `can_use_tool` callback, and
//! the `PreToolUse` hook chain. The first stage to fail wins; failures are
//! always `TOOL_ERROR`s carrying the tool name, input, and permission mode.

mod approvals;
mod pipeline;

pub use approvals::{ApprovalRecord, ApprovalStore, content_hash};
pub use pipeline::{CanUseTool, FnCanUseTool, GateDecision, PermissionPipeline, filter_tools};
