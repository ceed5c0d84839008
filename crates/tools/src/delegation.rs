//! Delegation tools — one per specialist. When the supervisor's LLM
//! invokes `delegate_to_<id>`, the tool returns a [`ToolCommand`] that
//! forces the handoff to that specialist node.

use std::sync::Arc;

use serde_json::Value;

use cc_domain::config::RoutingConfig;
use cc_domain::{Result, StatePatch, ToolDefinition};

use crate::registry::{Tool, ToolCommand, ToolOutcome};

const DELEGATE_PREFIX: &str = "delegate_to_";

pub struct DelegationTool {
    specialist_id: String,
    display_name: String,
    default_task: String,
}

impl DelegationTool {
    pub fn new(specialist_id: &str, display_name: &str) -> Self {
        Self {
            specialist_id: specialist_id.to_owned(),
            display_name: display_name.to_owned(),
            default_task: format!("{display_name} assistance needed"),
        }
    }
}

#[async_trait::async_trait]
impl Tool for DelegationTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: format!("{DELEGATE_PREFIX}{}", self.specialist_id),
            description: format!(
                "Delegate the conversation to the {} for specialized assistance.",
                self.display_name
            ),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "task_description": {
                        "type": "string",
                        "description": "What the specialist should focus on"
                    }
                }
            }),
        }
    }

    async fn invoke(&self, arguments: &Value) -> Result<ToolOutcome> {
        let task_description = arguments
            .get("task_description")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.default_task)
            .to_owned();

        Ok(ToolOutcome::Command(ToolCommand {
            goto: self.specialist_id.clone(),
            task_description,
            patch: StatePatch::new(),
        }))
    }
}

/// Build one delegation tool per configured specialist.
pub fn delegation_tools(routing: &RoutingConfig) -> Vec<Arc<dyn Tool>> {
    routing
        .specialists
        .iter()
        .map(|s| Arc::new(DelegationTool::new(&s.id, &s.display_name)) as Arc<dyn Tool>)
        .collect()
}

/// If `tool_name` is a delegation tool, the specialist id it targets.
pub fn delegation_target(tool_name: &str) -> Option<&str> {
    tool_name.strip_prefix(DELEGATE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invoke_returns_command_with_task() {
        let tool = DelegationTool::new("veterans", "Veterans Transition Specialist");
        let out = tool
            .invoke(&serde_json::json!({ "task_description": "MOS translation" }))
            .await
            .unwrap();
        match out {
            ToolOutcome::Command(cmd) => {
                assert_eq!(cmd.goto, "veterans");
                assert_eq!(cmd.task_description, "MOS translation");
            }
            _ => panic!("expected a command"),
        }
    }

    #[tokio::test]
    async fn missing_task_uses_default() {
        let tool = DelegationTool::new("career", "Career Resources Analyst");
        let out = tool.invoke(&serde_json::json!({})).await.unwrap();
        match out {
            ToolOutcome::Command(cmd) => {
                assert!(cmd.task_description.contains("Career Resources Analyst"));
            }
            _ => panic!("expected a command"),
        }
    }

    #[test]
    fn one_tool_per_specialist() {
        let routing = RoutingConfig::default();
        let tools = delegation_tools(&routing);
        assert_eq!(tools.len(), routing.specialists.len());
        assert_eq!(tools[0].definition().name, "delegate_to_career");
    }

    #[test]
    fn delegation_target_strips_prefix() {
        assert_eq!(delegation_target("delegate_to_justice"), Some("justice"));
        assert_eq!(delegation_target("resource_search"), None);
    }
}
