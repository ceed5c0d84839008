//! Human review requests and the store for interrupted turns.
//!
//! When the supervisor interrupts for review, the turn's state and
//! request payload are parked here (and the state durably persisted)
//! until `resume_turn` arrives with the reviewer's decision.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use cc_domain::ConversationState;
use cc_intelligence::ReviewPriority;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / decision types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The review payload surfaced to the external caller on interrupt.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRequest {
    pub question: String,
    pub priority: String,
    pub reasons: Vec<String>,
    /// Conversation context for the reviewer.
    pub user_query: String,
    pub quality_score: f64,
    pub routing_confidence: String,
    pub specialist_assigned: String,
    /// The options a reviewer may answer with.
    pub review_options: Vec<String>,
    pub recommended_wait_secs: u64,
}

impl ReviewRequest {
    pub fn options() -> Vec<String> {
        vec![
            "approve_and_continue".into(),
            "modify_approach".into(),
            "escalate_to_human_specialist".into(),
            "provide_feedback_and_retry".into(),
        ]
    }

    pub fn new(
        priority: ReviewPriority,
        reasons: Vec<String>,
        user_query: &str,
        quality_score: f64,
        routing_confidence: &str,
        specialist_assigned: &str,
        recommended_wait_secs: u64,
    ) -> Self {
        Self {
            question: format!("Human review requested for {priority} priority case"),
            priority: priority.as_str().to_owned(),
            reasons,
            user_query: user_query.to_owned(),
            quality_score,
            routing_confidence: routing_confidence.to_owned(),
            specialist_assigned: specialist_assigned.to_owned(),
            review_options: Self::options(),
            recommended_wait_secs,
        }
    }
}

/// The reviewer's answer, re-entering the interrupted node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    ApproveAndContinue,
    ModifyApproach {
        #[serde(default)]
        feedback: String,
    },
    EscalateToHumanSpecialist,
    ProvideFeedbackAndRetry {
        #[serde(default)]
        feedback: String,
    },
}

impl ReviewDecision {
    /// Parse a bare option name (as listed in `review_options`).
    pub fn from_option(option: &str, feedback: Option<&str>) -> Option<Self> {
        let feedback = feedback.unwrap_or_default().to_owned();
        match option {
            "approve_and_continue" => Some(Self::ApproveAndContinue),
            "modify_approach" => Some(Self::ModifyApproach { feedback }),
            "escalate_to_human_specialist" => Some(Self::EscalateToHumanSpecialist),
            "provide_feedback_and_retry" => Some(Self::ProvideFeedbackAndRetry { feedback }),
            _ => None,
        }
    }

    /// Human feedback carried by the decision, if any.
    pub fn feedback(&self) -> Option<&str> {
        match self {
            Self::ModifyApproach { feedback } | Self::ProvideFeedbackAndRetry { feedback }
                if !feedback.is_empty() =>
            {
                Some(feedback)
            }
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pending review store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An interrupted turn awaiting a reviewer.
pub struct PendingReview {
    pub user_id: String,
    pub node: String,
    pub state: ConversationState,
    pub request: ReviewRequest,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe store of interrupted turns, keyed by conversation id.
#[derive(Default)]
pub struct ReviewStore {
    pending: RwLock<HashMap<String, PendingReview>>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, conversation_id: &str, review: PendingReview) {
        self.pending
            .write()
            .insert(conversation_id.to_owned(), review);
    }

    /// Remove and return the pending review for a conversation.
    pub fn take(&self, conversation_id: &str) -> Option<PendingReview> {
        self.pending.write().remove(conversation_id)
    }

    /// Conversation ids currently awaiting review.
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.read().keys().cloned().collect()
    }

    pub fn is_pending(&self, conversation_id: &str) -> bool {
        self.pending.read().contains_key(conversation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReviewRequest {
        ReviewRequest::new(
            ReviewPriority::Medium,
            vec!["Low quality response detected".into()],
            "help me",
            4.5,
            "uncertain",
            "career",
            300,
        )
    }

    #[test]
    fn request_lists_all_four_options() {
        let req = request();
        assert_eq!(req.review_options.len(), 4);
        assert!(req.question.contains("medium"));
    }

    #[test]
    fn decision_parses_from_option_names() {
        assert_eq!(
            ReviewDecision::from_option("approve_and_continue", None),
            Some(ReviewDecision::ApproveAndContinue)
        );
        let retry = ReviewDecision::from_option("provide_feedback_and_retry", Some("cite sources"))
            .unwrap();
        assert_eq!(retry.feedback(), Some("cite sources"));
        assert!(ReviewDecision::from_option("unknown", None).is_none());
    }

    #[test]
    fn store_insert_take_round_trip() {
        let store = ReviewStore::new();
        store.insert(
            "c1",
            PendingReview {
                user_id: "u1".into(),
                node: "supervisor".into(),
                state: ConversationState::seed("u1", "c1"),
                request: request(),
                created_at: Utc::now(),
            },
        );
        assert!(store.is_pending("c1"));
        assert_eq!(store.pending_ids(), vec!["c1".to_owned()]);

        let review = store.take("c1").unwrap();
        assert_eq!(review.node, "supervisor");
        assert!(!store.is_pending("c1"));
        assert!(store.take("c1").is_none());
    }
}
