use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Conversation roles. The system prompt is assembled per-call by the
/// supervisor/specialists and never stored, so there is no `System` role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition exposed to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

/// Free-form metadata attached to every message: the producing agent,
/// the append timestamp (which also orders cross-writer merges), and
/// arbitrary flags the conditional edges inspect
/// (`conversation_complete`, `handoff_to`, `max_handoffs_reached`, …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub flags: serde_json::Map<String, serde_json::Value>,
}

impl MessageMeta {
    pub fn now(agent: Option<&str>) -> Self {
        Self {
            agent: agent.map(str::to_owned),
            timestamp: Utc::now(),
            flags: serde_json::Map::new(),
        }
    }

    /// Read a boolean flag, treating absence as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.flags.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    /// Read a string flag.
    pub fn flag_str(&self, key: &str) -> Option<&str> {
        self.flags.get(key).and_then(|v| v.as_str())
    }
}

/// A single message in the conversation history. Append-only: once in
/// `ConversationState::messages`, a record is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable unique id; dedupes append-merges across concurrent saves.
    pub id: uuid::Uuid,
    pub role: Role,
    pub content: String,
    /// Tool invocations requested by an assistant message. Each entry is
    /// answered by exactly one tool message before the next assistant
    /// message (tool-message pairing invariant).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For `Role::Tool` messages: the id of the call being answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    pub metadata: MessageMeta,
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            role: Role::User,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            metadata: MessageMeta::now(None),
        }
    }

    pub fn assistant(agent: &str, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            role: Role::Assistant,
            content: text.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            metadata: MessageMeta::now(Some(agent)),
        }
    }

    pub fn assistant_with_tool_calls(
        agent: &str,
        text: impl Into<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Self {
        let mut msg = Self::assistant(agent, text);
        msg.tool_calls = tool_calls;
        msg
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        content: impl Into<String>,
        agent: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            metadata: MessageMeta::now(Some(agent)),
        }
    }

    /// Attach a metadata flag, builder-style.
    pub fn with_flag(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.flags.insert(key.to_owned(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_defaults_to_false() {
        let msg = Message::assistant("supervisor", "hello");
        assert!(!msg.metadata.flag("conversation_complete"));
    }

    #[test]
    fn with_flag_round_trip() {
        let msg = Message::assistant("supervisor", "done")
            .with_flag("conversation_complete", true)
            .with_flag("handoff_to", "veterans");
        assert!(msg.metadata.flag("conversation_complete"));
        assert_eq!(msg.metadata.flag_str("handoff_to"), Some("veterans"));

        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert!(back.metadata.flag("conversation_complete"));
        assert_eq!(back.id, msg.id);
    }

    #[test]
    fn tool_result_carries_call_id() {
        let msg = Message::tool_result("call_1", "ok", "supervisor");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
    }
}
