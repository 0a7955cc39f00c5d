use super::*;

#[test]
fn test_namespaced_tool_names() {
    let plugin = PluginSpec::new("search");
    assert_eq!(plugin.namespaced("query"), "mcp__search__query");
}

#[test]
fn test_skill_fields() {
    let skill = Skill::new("review", "Reviews code", "Look closely.");
    assert_eq!(skill.name, "review");
    assert_eq!(skill.instructions, "Look closely.");
}

#[test]
fn test_subagent_builder() {
    let subagent = SubagentDefinition::new("researcher", "Researches", "You research.");
    assert!(subagent.driver.is_none());
    assert_eq!(subagent.name, "researcher");
}

#[test]
fn test_plugin_builder_chain() {
    let plugin = PluginSpec::new("helper")
        .with_description("A helper plugin")
        .with_skill(Skill::new("a", "b", "c"))
        .with_subagent(SubagentDefinition::new("sub", "d", "e"));
    assert_eq!(plugin.description.as_deref(), Some("A helper plugin"));
    assert_eq!(plugin.skills.len(), 1);
    assert!(plugin.subagent.is_some());
}
