//! The gate pipeline wrapping every tool invocation.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tandem_error::AgentError;
use tandem_hooks::HookContext;
use tandem_hooks::HookEvent;
use tandem_hooks::HookRegistry;
use tandem_protocol::PermissionBehavior;
use tandem_protocol::PermissionMode;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The caller-supplied permission callback.
#[async_trait]
pub trait CanUseTool: Send + Sync {
    /// Decide whether a tool call may proceed.
    async fn check(&self, tool_name: &str, tool_input: &Value) -> PermissionBehavior;
}

type CanUseToolFn =
    dyn Fn(String, Value) -> Pin<Box<dyn Future<Output = PermissionBehavior> + Send>>
        + Send
        + Sync;

/// A permission callback built from a closure.
pub struct FnCanUseTool {
    f: Box<CanUseToolFn>,
}

impl FnCanUseTool {
    /// Create a callback from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PermissionBehavior> + Send + 'static,
    {
        Self {
            f: Box::new(move |name, input| Box::pin(f(name, input))),
        }
    }
}

#[async_trait]
impl CanUseTool for FnCanUseTool {
    async fn check(&self, tool_name: &str, tool_input: &Value) -> PermissionBehavior {
        (self.f)(tool_name.to_string(), tool_input.clone()).await
    }
}

/// Apply the static filter to a registered toolset.
///
/// `allowed` (when present) intersects the registered set; `disallowed` is
/// then subtracted and always wins.
pub fn filter_tools(
    registered: &[String],
    allowed: Option<&[String]>,
    disallowed: &[String],
) -> Vec<String> {
    let allowed: Option<HashSet<&str>> =
        allowed.map(|names| names.iter().map(String::as_str).collect());
    let disallowed: HashSet<&str> = disallowed.iter().map(String::as_str).collect();

    registered
        .iter()
        .filter(|name| {
            allowed
                .as_ref()
                .is_none_or(|allowed| allowed.contains(name.as_str()))
        })
        .filter(|name| !disallowed.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Outcome of the gate pipeline for one tool invocation.
#[derive(Debug)]
pub enum GateDecision {
    /// Execution may proceed.
    Allow,
    /// The invocation is rejected with a `TOOL_ERROR`.
    Deny(AgentError),
    /// The invocation requires out-of-band user approval.
    NeedsApproval { reason: String },
}

impl GateDecision {
    /// Whether execution may proceed.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// The four-stage permission pipeline.
///
/// Stages 1–4 never mutate conversation state; only tool execution (which
/// happens after an `Allow`) may.
pub struct PermissionPipeline {
    mode: PermissionMode,
    can_use_tool: Option<Arc<dyn CanUseTool>>,
    hooks: Arc<HookRegistry>,
}

impl PermissionPipeline {
    /// Create a pipeline.
    pub fn new(
        mode: PermissionMode,
        can_use_tool: Option<Arc<dyn CanUseTool>>,
        hooks: Arc<HookRegistry>,
    ) -> Self {
        Self {
            mode,
            can_use_tool,
            hooks,
        }
    }

    /// The active permission mode.
    pub fn mode(&self) -> PermissionMode {
        self.mode
    }

    /// Change the permission mode for subsequent evaluations.
    pub fn set_mode(&mut self, mode: PermissionMode) {
        self.mode = mode;
    }

    fn tool_error(
        &self,
        message: impl Into<String>,
        tool_name: &str,
        tool_input: &Value,
    ) -> AgentError {
        AgentError::tool(message)
            .with_metadata("toolName", tool_name)
            .with_metadata("toolInput", tool_input.clone())
            .with_metadata("permissionMode", self.mode.as_str())
    }

    /// Evaluate the pipeline for one tool invocation.
    ///
    /// `effective_tools` is the statically filtered toolset for the turn;
    /// `is_edit_tool` reflects the tool's own edit-family declaration.
    #[allow(clippy::too_many_arguments)]
    pub async fn evaluate(
        &self,
        tool_name: &str,
        tool_input: &Value,
        tool_call_id: &str,
        is_edit_tool: bool,
        effective_tools: &[String],
        thread_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> GateDecision {
        // Stage 1: static filter.
        if !effective_tools.iter().any(|name| name == tool_name) {
            return GateDecision::Deny(self.tool_error(
                format!("tool not available: {tool_name}"),
                tool_name,
                tool_input,
            ));
        }

        // Stage 2: permission mode gate.
        match self.mode {
            PermissionMode::Plan => {
                debug!(tool_name, "Tool call blocked in plan mode");
                return GateDecision::Deny(self.tool_error(
                    format!("{tool_name} blocked in plan mode"),
                    tool_name,
                    tool_input,
                ));
            }
            PermissionMode::BypassPermissions => return GateDecision::Allow,
            PermissionMode::AcceptEdits if is_edit_tool => return GateDecision::Allow,
            PermissionMode::AcceptEdits | PermissionMode::Default => {}
        }

        // Stage 3: can_use_tool callback.
        if let Some(callback) = &self.can_use_tool {
            match callback.check(tool_name, tool_input).await {
                PermissionBehavior::Allow => {}
                PermissionBehavior::Deny => {
                    return GateDecision::Deny(self.tool_error(
                        format!("{tool_name} denied by canUseTool callback"),
                        tool_name,
                        tool_input,
                    ));
                }
                PermissionBehavior::Ask => {
                    return GateDecision::NeedsApproval {
                        reason: "requires user approval".to_string(),
                    };
                }
            }
        }

        // Stage 4: PreToolUse hooks.
        let ctx = HookContext::new(HookEvent::PreToolUse)
            .with_tool(tool_call_id, tool_name, tool_input.clone())
            .with_cancel(cancel.clone());
        let ctx = match thread_id {
            Some(thread_id) => ctx.with_thread_id(thread_id),
            None => ctx,
        };

        match self.hooks.run(&ctx).await {
            Ok(outputs) => {
                for output in outputs {
                    if let Some(reason) = output.block_reason() {
                        return GateDecision::Deny(self.tool_error(
                            format!("{tool_name} blocked by hook: {reason}"),
                            tool_name,
                            tool_input,
                        ));
                    }
                }
            }
            Err(e) => {
                return GateDecision::Deny(
                    self.tool_error(
                        format!("PreToolUse hook failed: {e}"),
                        tool_name,
                        tool_input,
                    )
                    .with_source(e),
                );
            }
        }

        GateDecision::Allow
    }
}

#[cfg(test)]
#[path = "pipeline.test.rs"]
mod tests;
