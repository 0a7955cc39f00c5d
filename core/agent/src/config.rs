//! Skills, plugins, and subagent definitions.

use std::sync::Arc;

use tandem_driver::ModelDriver;
use tandem_tools::Tool;

/// A skill loaded into the system prompt.
#[derive(Debug, Clone)]
pub struct Skill {
    pub name: String,
    pub description: String,
    /// Instructions injected into the prompt when the skill is active.
    pub instructions: String,
}

impl Skill {
    /// Create a skill.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: instructions.into(),
        }
    }
}

/// A child agent the `task` tool can delegate to.
#[derive(Clone)]
pub struct SubagentDefinition {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    /// Driver override; the parent's driver is used when absent.
    pub driver: Option<Arc<dyn ModelDriver>>,
}

impl SubagentDefinition {
    /// Create a subagent definition using the parent's driver.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            driver: None,
        }
    }

    /// Give the subagent its own driver.
    pub fn with_driver(mut self, driver: Arc<dyn ModelDriver>) -> Self {
        self.driver = Some(driver);
        self
    }
}

impl std::fmt::Debug for SubagentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubagentDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Setup callback run once when a plugin is installed into an agent.
pub type PluginSetup = Arc<dyn Fn() + Send + Sync>;

/// A plugin bundling tools, skills, and an optional subagent.
///
/// Plugin tools are registered under `mcp__<plugin>__<name>` so they never
/// collide with core tools.
#[derive(Clone, Default)]
pub struct PluginSpec {
    pub name: String,
    pub description: Option<String>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub skills: Vec<Skill>,
    pub subagent: Option<SubagentDefinition>,
    /// External MCP server this plugin proxies, if any. Transport wiring is
    /// the embedder's concern.
    pub mcp_server: Option<String>,
    pub setup: Option<PluginSetup>,
}

impl PluginSpec {
    /// Create an empty plugin.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add a skill.
    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Attach a subagent.
    pub fn with_subagent(mut self, subagent: SubagentDefinition) -> Self {
        self.subagent = Some(subagent);
        self
    }

    /// Attach a setup callback.
    pub fn with_setup(mut self, setup: PluginSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    /// The namespaced registry name for one of this plugin's tools.
    pub fn namespaced(&self, tool_name: &str) -> String {
        format!("mcp__{}__{tool_name}", self.name)
    }
}

impl std::fmt::Debug for PluginSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("tools", &self.tools.len())
            .field("skills", &self.skills.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "config.test.rs"]
mod tests;
