//! Human-in-the-loop evaluation: decides whether the turn needs a human
//! reviewer and at what priority.

use std::fmt;
use std::sync::Arc;

use cc_domain::config::Config;
use cc_domain::{ConversationState, QualityMetrics, RoutingConfidence, RoutingDecision};

/// Review priority, ordered: urgent > high > medium > low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReviewPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl ReviewPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewPriority::Low => "low",
            ReviewPriority::Medium => "medium",
            ReviewPriority::High => "high",
            ReviewPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for ReviewPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct InterventionAssessment {
    pub needs_human_intervention: bool,
    pub priority: ReviewPriority,
    pub reasons: Vec<String>,
    pub recommended_wait_secs: u64,
    /// Set for high/urgent priorities only.
    pub escalation_contact: Option<String>,
}

pub struct HumanLoopCoordinator {
    config: Arc<Config>,
}

impl HumanLoopCoordinator {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Evaluate every trigger; the final priority is the maximum across
    /// the triggered signals.
    pub fn evaluate(
        &self,
        state: &ConversationState,
        quality: &QualityMetrics,
        routing: &RoutingDecision,
    ) -> InterventionAssessment {
        let cfg = &self.config.human_loop;
        let mut reasons = Vec::new();
        let mut priority = ReviewPriority::Low;

        if quality.overall < cfg.quality_threshold {
            reasons.push("Low quality response detected".to_owned());
            priority = priority.max(ReviewPriority::Medium);
        }

        if routing.confidence_level == RoutingConfidence::Uncertain {
            reasons.push("Uncertain routing decision".to_owned());
            priority = priority.max(ReviewPriority::Medium);
        }

        if state.handoff_count >= cfg.handoff_threshold {
            reasons.push("Excessive specialist handoffs detected".to_owned());
            priority = priority.max(ReviewPriority::High);
        }

        if state.error_recovery_log.len() >= cfg.error_threshold {
            reasons.push("Multiple errors encountered".to_owned());
            priority = priority.max(ReviewPriority::Urgent);
        }

        if let Some(msg) = state.last_user_message() {
            let text = msg.content.to_lowercase();
            if cfg
                .sensitive_keywords
                .iter()
                .any(|k| text.contains(k.as_str()))
            {
                reasons.push("Sensitive topic detected".to_owned());
                priority = priority.max(ReviewPriority::Urgent);
            }
        }

        let needs_human_intervention = !reasons.is_empty();
        let recommended_wait_secs = match priority {
            ReviewPriority::High | ReviewPriority::Urgent => cfg.urgent_wait_secs,
            _ => cfg.default_wait_secs,
        };
        let escalation_contact = match priority {
            ReviewPriority::High | ReviewPriority::Urgent => {
                Some(cfg.escalation_contact.clone())
            }
            _ => None,
        };

        if needs_human_intervention {
            tracing::info!(
                priority = %priority,
                reasons = reasons.len(),
                conversation_id = %state.conversation_id,
                "human intervention flagged"
            );
        }

        InterventionAssessment {
            needs_human_intervention,
            priority,
            reasons,
            recommended_wait_secs,
            escalation_contact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{Message, StatePatch};

    fn coordinator() -> HumanLoopCoordinator {
        HumanLoopCoordinator::new(Arc::new(Config::default()))
    }

    fn state_with(user_message: &str) -> ConversationState {
        let mut s = ConversationState::seed("u", "c");
        s.apply(StatePatch::new().message(Message::user(user_message)));
        s
    }

    fn good_quality() -> QualityMetrics {
        QualityMetrics::from_components(8.0, 8.0, 8.0, 8.0, 8.0)
    }

    fn confident_routing() -> RoutingDecision {
        let mut d = RoutingDecision::uncertain("career");
        d.confidence_level = RoutingConfidence::High;
        d
    }

    #[test]
    fn clean_turn_needs_no_intervention() {
        let assessment = coordinator().evaluate(
            &state_with("tell me about solar"),
            &good_quality(),
            &confident_routing(),
        );
        assert!(!assessment.needs_human_intervention);
        assert_eq!(assessment.priority, ReviewPriority::Low);
        assert!(assessment.escalation_contact.is_none());
        assert_eq!(assessment.recommended_wait_secs, 300);
    }

    #[test]
    fn low_quality_is_medium_priority() {
        let quality = QualityMetrics::from_components(4.0, 4.0, 4.0, 4.0, 4.0);
        let assessment =
            coordinator().evaluate(&state_with("hello"), &quality, &confident_routing());
        assert!(assessment.needs_human_intervention);
        assert_eq!(assessment.priority, ReviewPriority::Medium);
    }

    #[test]
    fn uncertain_routing_is_medium_priority() {
        let assessment = coordinator().evaluate(
            &state_with("hello"),
            &good_quality(),
            &RoutingDecision::uncertain("career"),
        );
        assert_eq!(assessment.priority, ReviewPriority::Medium);
    }

    #[test]
    fn excessive_handoffs_are_high_priority() {
        let mut s = state_with("hello");
        s.handoff_count = 4;
        let assessment = coordinator().evaluate(&s, &good_quality(), &confident_routing());
        assert_eq!(assessment.priority, ReviewPriority::High);
        assert!(assessment.escalation_contact.is_some());
        assert_eq!(assessment.recommended_wait_secs, 60);
    }

    #[test]
    fn sensitive_topic_is_urgent() {
        let assessment = coordinator().evaluate(
            &state_with("I'm in crisis and need help now"),
            &good_quality(),
            &confident_routing(),
        );
        assert_eq!(assessment.priority, ReviewPriority::Urgent);
        assert!(assessment
            .reasons
            .iter()
            .any(|r| r.contains("Sensitive topic")));
    }

    #[test]
    fn priority_is_max_across_signals() {
        // Medium (low quality) + urgent (error log) → urgent.
        let mut s = state_with("hello");
        for _ in 0..2 {
            s.error_recovery_log.push(cc_domain::ErrorRecord {
                error_type: "provider".into(),
                message: "boom".into(),
                timestamp: chrono::Utc::now(),
                context: Default::default(),
                recovery_strategy: "log_and_continue".into(),
            });
        }
        let quality = QualityMetrics::from_components(2.0, 2.0, 2.0, 2.0, 2.0);
        let assessment = coordinator().evaluate(&s, &quality, &confident_routing());
        assert_eq!(assessment.priority, ReviewPriority::Urgent);
        assert!(assessment.reasons.len() >= 2);
    }
}
