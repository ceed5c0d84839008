//! Tool registry — builds tool definitions for the LLM and dispatches
//! tool calls with a per-tool deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use cc_domain::{Error, Result, StatePatch, ToolDefinition};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A Command-style transition requested by a tool: jump to `goto` with
/// `patch` applied. Delegation tools use this to force handoffs.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    /// Target node id.
    pub goto: String,
    /// What the target is being asked to do.
    pub task_description: String,
    /// Extra state updates carried by the command.
    pub patch: StatePatch,
}

/// What a tool invocation produced.
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// Textual content; becomes the tool message body.
    Content(String),
    /// A forced transition; the supervisor turns it into a handoff.
    Command(ToolCommand),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tool trait and registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// The definition exposed to the LLM. `definition().name` is the
    /// dispatch key.
    fn definition(&self) -> ToolDefinition;

    async fn invoke(&self, arguments: &Value) -> Result<ToolOutcome>;

    /// Per-tool deadline override. `None` uses the registry default.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
    default_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
            default_timeout,
        }
    }

    /// Register a tool. Later registrations shadow earlier ones with
    /// the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
    }

    /// Definitions for every registered tool, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<(usize, ToolDefinition)> = self
            .by_name
            .values()
            .map(|&idx| (idx, self.tools[idx].definition()))
            .collect();
        defs.sort_by_key(|(idx, _)| *idx);
        defs.into_iter().map(|(_, d)| d).collect()
    }

    /// Invoke a tool by name with its per-call deadline applied.
    ///
    /// Errors: `Other` for an unknown tool, `Timeout` on deadline, or
    /// whatever the tool itself raised. Callers convert all of these
    /// into failure tool messages — tool errors never abort a turn.
    pub async fn invoke(&self, name: &str, arguments: &Value) -> Result<ToolOutcome> {
        let tool = self
            .by_name
            .get(name)
            .map(|&idx| self.tools[idx].clone())
            .ok_or_else(|| Error::Other(format!("tool '{name}' is not registered")))?;

        let deadline = tool.timeout().unwrap_or(self.default_timeout);
        match tokio::time::timeout(deadline, tool.invoke(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "tool '{name}' exceeded {}ms",
                deadline.as_millis()
            ))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "Echo the input back.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "text": { "type": "string" } },
                    "required": ["text"]
                }),
            }
        }

        async fn invoke(&self, arguments: &Value) -> Result<ToolOutcome> {
            let text = arguments.get("text").and_then(|v| v.as_str()).unwrap_or("");
            Ok(ToolOutcome::Content(text.to_owned()))
        }
    }

    struct SlowTool;

    #[async_trait::async_trait]
    impl Tool for SlowTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "slow".into(),
                description: "Never finishes in time.".into(),
                parameters: serde_json::json!({ "type": "object" }),
            }
        }

        async fn invoke(&self, _arguments: &Value) -> Result<ToolOutcome> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ToolOutcome::Content("too late".into()))
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(20))
        }
    }

    fn registry() -> ToolRegistry {
        let mut reg = ToolRegistry::new(Duration::from_secs(5));
        reg.register(Arc::new(EchoTool));
        reg.register(Arc::new(SlowTool));
        reg
    }

    #[tokio::test]
    async fn dispatches_by_name() {
        let reg = registry();
        let out = reg
            .invoke("echo", &serde_json::json!({ "text": "hi" }))
            .await
            .unwrap();
        assert!(matches!(out, ToolOutcome::Content(ref s) if s == "hi"));
    }

    #[tokio::test]
    async fn unknown_tool_errors() {
        let reg = registry();
        let err = reg.invoke("nope", &serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("not registered"));
    }

    #[tokio::test]
    async fn per_tool_timeout_applies() {
        let reg = registry();
        let err = reg.invoke("slow", &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[test]
    fn definitions_preserve_registration_order() {
        let reg = registry();
        let names: Vec<_> = reg.definitions().iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["echo", "slow"]);
    }
}
