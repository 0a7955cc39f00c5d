//! Permission modes and callback decisions.

use serde::Deserialize;
use serde::Serialize;

/// Global permission mode for tool execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    /// No mode-level gating; the callback and hooks decide.
    #[default]
    Default,
    /// Every tool call is rejected.
    Plan,
    /// Edit-family tools are auto-allowed; everything else falls through.
    AcceptEdits,
    /// All tool calls are auto-allowed; the callback is never consulted.
    BypassPermissions,
}

impl PermissionMode {
    /// Whether edit-family tools skip the callback and hooks.
    pub fn auto_accept_edits(&self) -> bool {
        matches!(self, Self::AcceptEdits | Self::BypassPermissions)
    }

    /// Whether all tools skip the callback and hooks.
    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::BypassPermissions)
    }

    /// Whether every tool call is rejected outright.
    pub fn is_plan(&self) -> bool {
        matches!(self, Self::Plan)
    }

    /// Returns the wire representation of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Plan => "plan",
            Self::AcceptEdits => "acceptEdits",
            Self::BypassPermissions => "bypassPermissions",
        }
    }
}

impl std::fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision returned by the `can_use_tool` callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionBehavior {
    /// Proceed with the tool call.
    Allow,
    /// Reject the tool call.
    Deny,
    /// Pause for out-of-band user approval.
    #[default]
    Ask,
}

impl PermissionBehavior {
    /// Whether the call may proceed without approval.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Whether the call is rejected.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny)
    }

    /// Whether the call requires user approval.
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::Ask)
    }
}

#[cfg(test)]
#[path = "permission.test.rs"]
mod tests;
