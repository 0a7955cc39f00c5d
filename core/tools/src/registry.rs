//! Tool registry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::RwLock;

use tandem_driver::ToolDefinition;
use tracing::debug;

use crate::tool::Tool;

/// Registry mapping tool names to instances.
///
/// Iteration order is the tool name order, so definitions presented to the
/// model are stable across turns.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.register_as(tool.name().to_string(), tool);
    }

    /// Register a tool under an explicit name (used for namespaced plugin
    /// tools).
    pub fn register_as(&self, name: String, tool: Arc<dyn Tool>) {
        debug!(name = %name, "Registered tool");
        if let Ok(mut tools) = self.tools.write() {
            tools.insert(name, tool);
        }
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .read()
            .ok()
            .and_then(|tools| tools.get(name).cloned())
    }

    /// All registered tool names.
    pub fn names(&self) -> Vec<String> {
        self.tools
            .read()
            .map(|tools| tools.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether a tool is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .map(|tools| tools.contains_key(name))
            .unwrap_or(false)
    }

    /// Remove a tool. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.tools
            .write()
            .map(|mut tools| tools.remove(name).is_some())
            .unwrap_or(false)
    }

    /// Definitions for the given tool names, skipping unknown names.
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.get(name).map(|t| t.to_definition()))
            .collect()
    }

    /// Whether the named tool is in the edit family.
    pub fn is_edit_tool(&self, name: &str) -> bool {
        self.get(name).is_some_and(|t| t.is_edit_tool())
    }
}

#[cfg(test)]
#[path = "registry.test.rs"]
mod tests;
