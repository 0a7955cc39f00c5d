use super::*;
use crate::config::PluginSpec;
use crate::testing::ScriptedDriver;
use serde_json::json;
use tandem_tools::ToolContext;
use tandem_tools::ToolFailure;
use tandem_tools::ToolOutput;
use tandem_tools::builtin::WriteTool;

fn driver() -> Arc<ScriptedDriver> {
    Arc::new(ScriptedDriver::new("primary", vec![]))
}

struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }

    async fn execute(
        &self,
        input: serde_json::Value,
        _ctx: &mut ToolContext,
    ) -> std::result::Result<ToolOutput, ToolFailure> {
        Ok(ToolOutput::json(input))
    }
}

#[test]
fn test_model_is_required() {
    let err = AgentBuilder::new().build().unwrap_err();
    assert_eq!(err.code, tandem_error::ErrorCode::Configuration);
}

#[test]
fn test_system_prompt_xor_prompt_builder() {
    let err = AgentBuilder::new()
        .model(driver())
        .system_prompt("static")
        .prompt_builder(Arc::new(crate::prompt::DefaultPromptBuilder::new("base")))
        .build()
        .unwrap_err();
    assert_eq!(err.code, tandem_error::ErrorCode::Configuration);
    assert!(err.message.contains("mutually exclusive"));
}

#[test]
fn test_agent_id_shape() {
    let agent = AgentBuilder::new().model(driver()).build().unwrap();
    assert!(agent.id().starts_with("agent-"));
}

#[test]
fn test_plugin_tools_are_namespaced() {
    let agent = AgentBuilder::new()
        .model(driver())
        .plugin(PluginSpec::new("search").with_tool(Arc::new(EchoTool)))
        .build()
        .unwrap();

    assert!(agent.get_active_tools().contains(&"mcp__search__echo".to_string()));
    assert!(!agent.get_active_tools().contains(&"echo".to_string()));
}

#[test]
fn test_plugin_skills_and_setup() {
    let setup_ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let setup_flag = setup_ran.clone();

    let agent = AgentBuilder::new()
        .model(driver())
        .plugin(
            PluginSpec::new("helper")
                .with_skill(crate::config::Skill::new("greet", "Greets", "Say hello first."))
                .with_setup(Arc::new(move || {
                    setup_flag.store(true, std::sync::atomic::Ordering::SeqCst);
                })),
        )
        .build()
        .unwrap();

    assert!(setup_ran.load(std::sync::atomic::Ordering::SeqCst));
    assert_eq!(agent.get_skills().len(), 1);
    assert_eq!(agent.get_skills()[0].name, "greet");
}

#[test]
fn test_task_tool_injected_with_subagents() {
    let agent = AgentBuilder::new()
        .model(driver())
        .subagent(crate::config::SubagentDefinition::new(
            "researcher",
            "Researches",
            "You research things.",
        ))
        .build()
        .unwrap();

    let tools = agent.get_active_tools();
    assert!(tools.contains(&"task".to_string()));
    assert!(tools.contains(&"task_output".to_string()));
}

#[test]
fn test_task_tool_absent_without_subagents() {
    let agent = AgentBuilder::new().model(driver()).build().unwrap();
    assert!(!agent.get_active_tools().contains(&"task".to_string()));
}

#[test]
fn test_task_tool_respects_disabled_core_tools() {
    let agent = AgentBuilder::new()
        .model(driver())
        .general_purpose_subagent(true)
        .disabled_core_tools(vec!["task".to_string()])
        .build()
        .unwrap();
    assert!(!agent.get_active_tools().contains(&"task".to_string()));
}

#[test]
fn test_general_purpose_subagent_injects_task_tool() {
    let agent = AgentBuilder::new()
        .model(driver())
        .general_purpose_subagent(true)
        .build()
        .unwrap();
    assert!(agent.get_active_tools().contains(&"task".to_string()));
}

#[test]
fn test_permission_mode_setter() {
    let agent = AgentBuilder::new()
        .model(driver())
        .tool(Arc::new(WriteTool::new()))
        .build()
        .unwrap();

    assert_eq!(agent.permission_mode(), tandem_protocol::PermissionMode::Default);
    agent.set_permission_mode(tandem_protocol::PermissionMode::Plan);
    assert_eq!(agent.permission_mode(), tandem_protocol::PermissionMode::Plan);
}
