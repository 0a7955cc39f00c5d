use super::*;
use crate::builtin::EditTool;
use crate::builtin::WriteTool;
use crate::context::InterruptResponses;
use crate::context::ToolContext;
use crate::failure::ToolFailure;
use crate::tool::ToolOutput;
use async_trait::async_trait;
use serde_json::Value;

struct NoopTool;

#[async_trait]
impl Tool for NoopTool {
    fn name(&self) -> &str {
        "noop"
    }

    fn description(&self) -> &str {
        "Does nothing"
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(
        &self,
        _input: Value,
        _ctx: &mut ToolContext,
    ) -> Result<ToolOutput, ToolFailure> {
        Ok(ToolOutput::text(""))
    }
}

#[test]
fn test_register_and_get() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(NoopTool));

    assert!(registry.contains("noop"));
    assert!(registry.get("noop").is_some());
    assert!(registry.get("other").is_none());
}

#[test]
fn test_register_as_namespaced() {
    let registry = ToolRegistry::new();
    registry.register_as("mcp__search__noop".to_string(), Arc::new(NoopTool));

    assert!(registry.contains("mcp__search__noop"));
    assert!(!registry.contains("noop"));
}

#[test]
fn test_names_are_sorted() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(WriteTool::new()));
    registry.register(Arc::new(EditTool::new()));
    registry.register(Arc::new(NoopTool));

    assert_eq!(registry.names(), vec!["edit", "noop", "write"]);
}

#[test]
fn test_definitions_for_skips_unknown() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(NoopTool));

    let defs = registry.definitions_for(&["noop".to_string(), "ghost".to_string()]);
    assert_eq!(defs.len(), 1);
    assert_eq!(defs[0].name, "noop");
}

#[test]
fn test_edit_family_lookup() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(WriteTool::new()));
    registry.register(Arc::new(NoopTool));

    assert!(registry.is_edit_tool("write"));
    assert!(!registry.is_edit_tool("noop"));
    assert!(!registry.is_edit_tool("missing"));
}

#[test]
fn test_remove() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(NoopTool));
    assert!(registry.remove("noop"));
    assert!(!registry.remove("noop"));
}
