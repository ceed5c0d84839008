//! The conversation state — the single value that flows between graph
//! nodes — and the patch type nodes use to update it.
//!
//! Fields are partitioned by update semantics:
//! - **overwrite**: last writer in a turn wins (`Option<T>` in the patch).
//! - **append-only**: writers only ever extend (`Vec<T>` in the patch);
//!   concurrent saves merge by element id and timestamp, never dropping
//!   or reordering a writer's own entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::assessment::{IdentityProfile, IntelligenceLevel, QualityMetrics, RoutingDecision,
    RoutingConfidence};
use crate::message::{Message, Role};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Record types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Workflow lifecycle of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Active,
    PendingHuman,
    Completed,
    WaitingForInput,
}

/// One supervisor→specialist (or specialist→supervisor) transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub from_node: String,
    pub to_node: String,
    pub timestamp: DateTime<Utc>,
    pub task_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// One recovered error, appended to `error_recovery_log`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error_type: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    pub recovery_strategy: String,
}

/// A resource surfaced to the user (program, organization, contact).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecommendation {
    pub title: String,
    pub organization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A self-reflection note left by a node for later turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub node: String,
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

/// Delegation context captured by the supervisor when issuing a handoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationMetadata {
    pub task_description: String,
    pub from_node: String,
    pub handoff_time: DateTime<Utc>,
    pub routing_confidence: RoutingConfidence,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: String,
    pub conversation_id: String,

    /// Store revision this state was loaded at. Bumped on every save;
    /// lets the store detect concurrent writers and merge their appends.
    #[serde(default)]
    pub revision: u64,

    // ── Overwrite fields (last writer wins within a turn) ─────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_specialist: Option<String>,
    #[serde(default)]
    pub workflow_state: WorkflowState,
    #[serde(default)]
    pub conversation_complete: bool,
    /// Monotonically non-decreasing; incremented only by the supervisor.
    #[serde(default)]
    pub handoff_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_identity: Option<IdentityProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
    #[serde(default)]
    pub confidence_score: f64,
    #[serde(default)]
    pub intelligence_level: IntelligenceLevel,
    #[serde(default)]
    pub needs_human_review: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordination: Option<CoordinationMetadata>,

    // ── Append-only sequences ─────────────────────────────────────
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub specialist_handoffs: Vec<HandoffRecord>,
    #[serde(default)]
    pub resource_recommendations: Vec<ResourceRecommendation>,
    #[serde(default)]
    pub error_recovery_log: Vec<ErrorRecord>,
    #[serde(default)]
    pub reflection_history: Vec<ReflectionEntry>,
}

impl ConversationState {
    /// Empty seed for a new conversation: zeroed counters, empty
    /// sequences, `workflow_state = active`.
    pub fn seed(user_id: &str, conversation_id: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            conversation_id: conversation_id.to_owned(),
            revision: 0,
            current_specialist: None,
            workflow_state: WorkflowState::Active,
            conversation_complete: false,
            handoff_count: 0,
            enhanced_identity: None,
            routing_decision: None,
            quality_metrics: None,
            confidence_score: 0.0,
            intelligence_level: IntelligenceLevel::default(),
            needs_human_review: false,
            coordination: None,
            messages: Vec::new(),
            tools_used: Vec::new(),
            specialist_handoffs: Vec::new(),
            resource_recommendations: Vec::new(),
            error_recovery_log: Vec::new(),
            reflection_history: Vec::new(),
        }
    }

    /// Session key for the performance tracker and analytics sink.
    pub fn session_id(&self) -> String {
        format!("{}:{}", self.user_id, self.conversation_id)
    }

    /// Most recent user message, scanning in reverse.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Most recent assistant message, scanning in reverse.
    pub fn last_assistant_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// Apply a patch: overwrite fields replace, sequences extend.
    ///
    /// `handoff_count` is clamped so it can never decrease (a stale
    /// writer loses, silently).
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(v) = patch.current_specialist {
            self.current_specialist = v;
        }
        if let Some(v) = patch.workflow_state {
            self.workflow_state = v;
        }
        if let Some(v) = patch.conversation_complete {
            self.conversation_complete = v;
        }
        if let Some(v) = patch.handoff_count {
            self.handoff_count = self.handoff_count.max(v);
        }
        if let Some(v) = patch.enhanced_identity {
            self.enhanced_identity = Some(v);
        }
        if let Some(v) = patch.routing_decision {
            self.routing_decision = Some(v);
        }
        if let Some(v) = patch.quality_metrics {
            self.intelligence_level = v.intelligence_level;
            self.quality_metrics = Some(v);
        }
        if let Some(v) = patch.confidence_score {
            self.confidence_score = v;
        }
        if let Some(v) = patch.needs_human_review {
            self.needs_human_review = v;
        }
        if let Some(v) = patch.coordination {
            self.coordination = Some(v);
        }

        self.messages.extend(patch.messages);
        self.tools_used.extend(patch.tools_used);
        self.specialist_handoffs.extend(patch.specialist_handoffs);
        self.resource_recommendations
            .extend(patch.resource_recommendations);
        self.error_recovery_log.extend(patch.error_recovery_log);
        self.reflection_history.extend(patch.reflection_history);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// State patch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A node's write set for one step. `None`/empty means "no change".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatePatch {
    /// `Some(None)` explicitly clears the current specialist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_specialist: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state: Option<WorkflowState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_identity: Option<IdentityProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_metrics: Option<QualityMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_human_review: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordination: Option<CoordinationMetadata>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specialist_handoffs: Vec<HandoffRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_recommendations: Vec<ResourceRecommendation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_recovery_log: Vec<ErrorRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reflection_history: Vec<ReflectionEntry>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, msg: Message) -> Self {
        self.messages.push(msg);
        self
    }

    pub fn tool_used(mut self, name: impl Into<String>) -> Self {
        self.tools_used.push(name.into());
        self
    }

    pub fn handoff(mut self, record: HandoffRecord) -> Self {
        self.specialist_handoffs.push(record);
        self
    }

    pub fn error(mut self, record: ErrorRecord) -> Self {
        self.error_recovery_log.push(record);
        self
    }

    pub fn complete(mut self) -> Self {
        self.conversation_complete = Some(true);
        self.workflow_state = Some(WorkflowState::Completed);
        self.current_specialist = Some(None);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ConversationState {
        ConversationState::seed("u1", "c1")
    }

    #[test]
    fn seed_is_empty_and_active() {
        let s = state();
        assert_eq!(s.workflow_state, WorkflowState::Active);
        assert_eq!(s.handoff_count, 0);
        assert!(s.messages.is_empty());
        assert!(!s.conversation_complete);
    }

    #[test]
    fn apply_overwrites_and_appends() {
        let mut s = state();
        s.apply(
            StatePatch::new()
                .message(Message::user("hello"))
                .tool_used("resource_search"),
        );
        s.apply(StatePatch {
            handoff_count: Some(1),
            current_specialist: Some(Some("veterans".into())),
            ..Default::default()
        });

        assert_eq!(s.messages.len(), 1);
        assert_eq!(s.tools_used, vec!["resource_search".to_string()]);
        assert_eq!(s.handoff_count, 1);
        assert_eq!(s.current_specialist.as_deref(), Some("veterans"));
    }

    #[test]
    fn handoff_count_never_decreases() {
        let mut s = state();
        s.apply(StatePatch {
            handoff_count: Some(2),
            ..Default::default()
        });
        s.apply(StatePatch {
            handoff_count: Some(1),
            ..Default::default()
        });
        assert_eq!(s.handoff_count, 2);
    }

    #[test]
    fn appends_preserve_order_and_never_dedupe() {
        let mut s = state();
        s.apply(StatePatch::new().tool_used("a").tool_used("b"));
        s.apply(StatePatch::new().tool_used("a"));
        assert_eq!(s.tools_used, vec!["a", "b", "a"]);
    }

    #[test]
    fn complete_patch_sets_terminal_fields() {
        let mut s = state();
        s.current_specialist = Some("career".into());
        s.apply(StatePatch::new().complete());
        assert!(s.conversation_complete);
        assert_eq!(s.workflow_state, WorkflowState::Completed);
        assert_eq!(s.current_specialist, None);
    }

    #[test]
    fn last_user_message_scans_in_reverse() {
        let mut s = state();
        s.apply(
            StatePatch::new()
                .message(Message::user("first"))
                .message(Message::assistant("supervisor", "reply"))
                .message(Message::user("second")),
        );
        assert_eq!(s.last_user_message().unwrap().content, "second");
        assert_eq!(s.last_assistant_message().unwrap().content, "reply");
    }

    #[test]
    fn quality_patch_updates_intelligence_level() {
        use crate::assessment::QualityMetrics;
        let mut s = state();
        s.apply(StatePatch {
            quality_metrics: Some(QualityMetrics::from_components(
                10.0, 10.0, 10.0, 10.0, 10.0,
            )),
            ..Default::default()
        });
        assert_eq!(s.intelligence_level, IntelligenceLevel::Exceptional);
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut s = state();
        s.apply(
            StatePatch::new()
                .message(Message::user("hi"))
                .handoff(HandoffRecord {
                    from_node: "supervisor".into(),
                    to_node: "veterans".into(),
                    timestamp: Utc::now(),
                    task_description: "transition support".into(),
                    tool_call_id: Some("call_1".into()),
                }),
        );
        let json = serde_json::to_string(&s).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.messages.len(), 1);
        assert_eq!(back.specialist_handoffs.len(), 1);
        assert_eq!(back.specialist_handoffs[0].to_node, "veterans");
    }
}
