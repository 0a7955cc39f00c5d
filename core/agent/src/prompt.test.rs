use super::*;
use crate::config::Skill;

#[test]
fn test_base_only() {
    let builder = DefaultPromptBuilder::new("You are a helpful assistant.");
    let prompt = builder.build(&PromptContext {
        tools: &[],
        skills: &[],
        plugins: &[],
        permission_mode: PermissionMode::Default,
        delegation_instructions: None,
    });
    assert_eq!(prompt, "You are a helpful assistant.");
}

#[test]
fn test_sections_appear_when_present() {
    let builder = DefaultPromptBuilder::new("Base.");
    let skills = vec![Skill::new("review", "Reviews code", "Look for bugs.")];
    let tools = vec!["write".to_string(), "edit".to_string()];
    let plugins = vec!["search".to_string()];

    let prompt = builder.build(&PromptContext {
        tools: &tools,
        skills: &skills,
        plugins: &plugins,
        permission_mode: PermissionMode::Default,
        delegation_instructions: Some("Delegate long research to subagents."),
    });

    assert!(prompt.contains("# Tools"));
    assert!(prompt.contains("write, edit"));
    assert!(prompt.contains("# Skills"));
    assert!(prompt.contains("## review"));
    assert!(prompt.contains("Look for bugs."));
    assert!(prompt.contains("# Plugins"));
    assert!(prompt.contains("search"));
    assert!(prompt.contains("# Delegation"));
}

#[test]
fn test_plan_mode_notice() {
    let builder = DefaultPromptBuilder::new("Base.");
    let prompt = builder.build(&PromptContext {
        tools: &[],
        skills: &[],
        plugins: &[],
        permission_mode: PermissionMode::Plan,
        delegation_instructions: None,
    });
    assert!(prompt.contains("plan mode"));
}
