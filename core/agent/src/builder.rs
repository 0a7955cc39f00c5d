//! Agent construction.

use std::collections::HashMap;
use std::sync::Arc;

use tandem_context::ContextManager;
use tandem_driver::ModelDriver;
use tandem_error::AgentError;
use tandem_error::Result;
use tandem_guardrails::Guardrail;
use tandem_hooks::Hook;
use tandem_hooks::HookEvent;
use tandem_hooks::HookRegistry;
use tandem_permissions::CanUseTool;
use tandem_protocol::PermissionMode;
use tandem_store::Checkpointer;
use tandem_store::MemoryTaskStore;
use tandem_store::TaskStore;
use tandem_tasks::TaskManager;
use tandem_tools::Tool;
use tandem_tools::ToolRegistry;
use tracing::debug;

use crate::agent::Agent;
use crate::config::PluginSpec;
use crate::config::Skill;
use crate::config::SubagentDefinition;
use crate::prompt::PromptBuilder;
use crate::retry::DEFAULT_MAX_RETRIES;
use crate::task_tool::TaskOutputTool;
use crate::task_tool::TaskTool;

const DEFAULT_MAX_STEPS: u32 = 16;

/// Builder for constructing an [`Agent`].
pub struct AgentBuilder {
    driver: Option<Arc<dyn ModelDriver>>,
    fallback: Option<Arc<dyn ModelDriver>>,
    system_prompt: Option<String>,
    prompt_builder: Option<Arc<dyn PromptBuilder>>,
    tools: Vec<Arc<dyn Tool>>,
    allowed_tools: Option<Vec<String>>,
    disallowed_tools: Vec<String>,
    disabled_core_tools: Vec<String>,
    plugins: Vec<PluginSpec>,
    subagents: Vec<SubagentDefinition>,
    delegation_instructions: Option<String>,
    skills: Vec<Skill>,
    permission_mode: PermissionMode,
    can_use_tool: Option<Arc<dyn CanUseTool>>,
    hooks: Arc<HookRegistry>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    context: Option<Arc<ContextManager>>,
    task_store: Option<Arc<dyn TaskStore>>,
    input_guardrails: Vec<Arc<dyn Guardrail>>,
    general_purpose_subagent: bool,
    max_steps: u32,
    max_retries: u32,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            driver: None,
            fallback: None,
            system_prompt: None,
            prompt_builder: None,
            tools: Vec::new(),
            allowed_tools: None,
            disallowed_tools: Vec::new(),
            disabled_core_tools: Vec::new(),
            plugins: Vec::new(),
            subagents: Vec::new(),
            delegation_instructions: None,
            skills: Vec::new(),
            permission_mode: PermissionMode::default(),
            can_use_tool: None,
            hooks: Arc::new(HookRegistry::new()),
            checkpointer: None,
            context: None,
            task_store: None,
            input_guardrails: Vec::new(),
            general_purpose_subagent: false,
            max_steps: DEFAULT_MAX_STEPS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Set the primary model driver.
    pub fn model(mut self, driver: Arc<dyn ModelDriver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Set the fallback model, used at most once per turn on transient
    /// failures.
    pub fn fallback_model(mut self, driver: Arc<dyn ModelDriver>) -> Self {
        self.fallback = Some(driver);
        self
    }

    /// Use a static system prompt. Mutually exclusive with
    /// [`prompt_builder`](Self::prompt_builder).
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Use a dynamic prompt builder. Mutually exclusive with
    /// [`system_prompt`](Self::system_prompt).
    pub fn prompt_builder(mut self, builder: Arc<dyn PromptBuilder>) -> Self {
        self.prompt_builder = Some(builder);
        self
    }

    /// Register a tool.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Register several tools.
    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Restrict the toolset to this include-list.
    pub fn allowed_tools(mut self, names: Vec<String>) -> Self {
        self.allowed_tools = Some(names);
        self
    }

    /// Exclude tools by name. Wins over the include-list.
    pub fn disallowed_tools(mut self, names: Vec<String>) -> Self {
        self.disallowed_tools = names;
        self
    }

    /// Disable core tools (e.g. `"task"`).
    pub fn disabled_core_tools(mut self, names: Vec<String>) -> Self {
        self.disabled_core_tools = names;
        self
    }

    /// Install a plugin.
    pub fn plugin(mut self, plugin: PluginSpec) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Register a subagent the `task` tool can delegate to.
    pub fn subagent(mut self, subagent: SubagentDefinition) -> Self {
        self.subagents.push(subagent);
        self
    }

    /// Instructions appended to the prompt when delegation is available.
    pub fn delegation_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.delegation_instructions = Some(instructions.into());
        self
    }

    /// Enable the general-purpose subagent (injects the `task` tool even
    /// with no named subagents).
    pub fn general_purpose_subagent(mut self, enabled: bool) -> Self {
        self.general_purpose_subagent = enabled;
        self
    }

    /// Add a skill.
    pub fn skill(mut self, skill: Skill) -> Self {
        self.skills.push(skill);
        self
    }

    /// Set the permission mode.
    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    /// Set the `can_use_tool` callback.
    pub fn can_use_tool(mut self, callback: Arc<dyn CanUseTool>) -> Self {
        self.can_use_tool = Some(callback);
        self
    }

    /// Register a hook.
    pub fn hook(self, event: HookEvent, hook: Arc<dyn Hook>) -> Self {
        self.hooks.register(event, hook);
        self
    }

    /// Use an existing hook registry.
    pub fn hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set the checkpoint store.
    pub fn checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Set the context manager.
    pub fn context_manager(mut self, context: Arc<ContextManager>) -> Self {
        self.context = Some(context);
        self
    }

    /// Set the task store backing the task manager.
    pub fn task_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.task_store = Some(store);
        self
    }

    /// Add an input guardrail.
    pub fn input_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.input_guardrails.push(guardrail);
        self
    }

    /// Bound the model tool-call loop.
    pub fn max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Bound hook-directed retries.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Build the agent.
    ///
    /// Fails with a `CONFIGURATION_ERROR` when no model is set or when both
    /// `system_prompt` and `prompt_builder` are configured.
    pub fn build(self) -> Result<Agent> {
        let driver = self
            .driver
            .ok_or_else(|| AgentError::configuration("a model driver is required"))?;

        if self.system_prompt.is_some() && self.prompt_builder.is_some() {
            return Err(AgentError::configuration(
                "systemPrompt and promptBuilder are mutually exclusive",
            ));
        }

        let registry = Arc::new(ToolRegistry::new());
        for tool in self.tools {
            registry.register(tool);
        }

        let mut skills = self.skills;
        let mut subagents: HashMap<String, SubagentDefinition> = self
            .subagents
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();

        let mut plugin_names = Vec::with_capacity(self.plugins.len());
        for plugin in &self.plugins {
            if let Some(setup) = &plugin.setup {
                setup();
            }
            for tool in &plugin.tools {
                registry.register_as(plugin.namespaced(tool.name()), tool.clone());
            }
            skills.extend(plugin.skills.iter().cloned());
            if let Some(subagent) = &plugin.subagent {
                subagents.insert(subagent.name.clone(), subagent.clone());
            }
            debug!(plugin = %plugin.name, tools = plugin.tools.len(), "Installed plugin");
            plugin_names.push(plugin.name.clone());
        }

        let task_store = self
            .task_store
            .unwrap_or_else(|| Arc::new(MemoryTaskStore::new()));
        let task_manager = Arc::new(TaskManager::new(task_store));

        // The task tool is implicit: present whenever delegation targets
        // exist, unless disabled as a core tool.
        let delegation_available = !subagents.is_empty() || self.general_purpose_subagent;
        if delegation_available && !self.disabled_core_tools.iter().any(|n| n == "task") {
            registry.register(Arc::new(TaskTool::new(
                task_manager.clone(),
                subagents.clone(),
                driver.clone(),
            )));
            registry.register(Arc::new(TaskOutputTool::new(task_manager.clone())));
        }

        Ok(Agent::from_parts(
            driver,
            self.fallback,
            self.system_prompt,
            self.prompt_builder,
            registry,
            self.allowed_tools,
            self.disallowed_tools,
            self.disabled_core_tools,
            self.hooks,
            self.checkpointer,
            self.context,
            task_manager,
            self.permission_mode,
            self.can_use_tool,
            skills,
            plugin_names,
            subagents,
            self.input_guardrails,
            self.delegation_instructions,
            self.max_steps,
            self.max_retries,
        ))
    }
}

impl Agent {
    /// Create a builder for constructing an agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }
}

#[cfg(test)]
#[path = "builder.test.rs"]
mod tests;
