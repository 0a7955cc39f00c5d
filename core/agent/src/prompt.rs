//! System prompt construction.

use tandem_protocol::PermissionMode;

use crate::config::Skill;

/// Everything a prompt builder may draw on.
pub struct PromptContext<'a> {
    /// Effective tool names for the turn.
    pub tools: &'a [String],
    pub skills: &'a [Skill],
    pub plugins: &'a [String],
    pub permission_mode: PermissionMode,
    pub delegation_instructions: Option<&'a str>,
}

/// Builds the system prompt for a turn.
///
/// Exactly one of a static `system_prompt` or a `PromptBuilder` may be
/// configured on an agent.
pub trait PromptBuilder: Send + Sync {
    /// Build the system prompt.
    fn build(&self, ctx: &PromptContext<'_>) -> String;
}

/// The default sectioned prompt builder.
pub struct DefaultPromptBuilder {
    base: String,
}

impl DefaultPromptBuilder {
    /// Create a builder with base instructions.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

impl PromptBuilder for DefaultPromptBuilder {
    fn build(&self, ctx: &PromptContext<'_>) -> String {
        let mut prompt = self.base.clone();

        if !ctx.tools.is_empty() {
            prompt.push_str("\n\n# Tools\n\nAvailable tools: ");
            prompt.push_str(&ctx.tools.join(", "));
        }

        if !ctx.skills.is_empty() {
            prompt.push_str("\n\n# Skills\n");
            for skill in ctx.skills {
                prompt.push_str(&format!(
                    "\n## {}\n{}\n\n{}\n",
                    skill.name, skill.description, skill.instructions
                ));
            }
        }

        if !ctx.plugins.is_empty() {
            prompt.push_str("\n\n# Plugins\n\nInstalled plugins: ");
            prompt.push_str(&ctx.plugins.join(", "));
        }

        if let Some(instructions) = ctx.delegation_instructions {
            prompt.push_str("\n\n# Delegation\n\n");
            prompt.push_str(instructions);
        }

        if ctx.permission_mode.is_plan() {
            prompt.push_str(
                "\n\nYou are in plan mode: describe intended actions instead of executing tools.",
            );
        }

        prompt
    }
}

#[cfg(test)]
#[path = "prompt.test.rs"]
mod tests;
