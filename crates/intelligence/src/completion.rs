//! Completion detection: accumulates a confidence score from
//! independent signals and classifies the turn as complete, needing a
//! follow-up, or continuing.

use std::sync::Arc;

use cc_domain::config::Config;
use cc_domain::ConversationState;

/// What the checker recommends the supervisor do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendedAction {
    Complete,
    Followup,
    Continue,
}

#[derive(Debug, Clone)]
pub struct CompletionStatus {
    /// Accumulated signal score, clamped to [0, 1].
    pub score: f64,
    /// Human-readable descriptions of the signals that fired.
    pub signals: Vec<String>,
    pub is_complete: bool,
    pub needs_followup: bool,
    pub recommended_action: RecommendedAction,
}

pub struct CompletionChecker {
    config: Arc<Config>,
}

impl CompletionChecker {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Score completion signals for the current turn.
    ///
    /// Each signal type contributes once: closure keywords +0.3,
    /// handoff budget spent +0.4, resources provided +0.2, contact
    /// info in the specialist response +0.3, natural ending +0.5.
    pub fn check(
        &self,
        user_message: &str,
        state: &ConversationState,
        specialist_response: &str,
    ) -> CompletionStatus {
        let cfg = &self.config.completion;
        let user_lower = user_message.to_lowercase();
        let response_lower = specialist_response.to_lowercase();

        let mut score: f64 = 0.0;
        let mut signals = Vec::new();

        let matched_closures: Vec<&str> = cfg
            .closure_keywords
            .iter()
            .filter(|k| user_lower.contains(k.as_str()))
            .map(String::as_str)
            .collect();
        if !matched_closures.is_empty() {
            signals.push(format!(
                "User expressed gratitude/closure: {}",
                matched_closures.join(", ")
            ));
            score += 0.3;
        }

        if state.handoff_count >= cfg.handoff_signal_at {
            signals.push(format!(
                "Multiple handoffs completed ({})",
                state.handoff_count
            ));
            score += 0.4;
        }

        let resources = state.resource_recommendations.len();
        if resources >= cfg.resource_signal_at {
            signals.push(format!("Multiple resources provided ({resources})"));
            score += 0.2;
        }

        if cfg
            .contact_markers
            .iter()
            .any(|m| response_lower.contains(m.as_str()))
        {
            signals.push("Contact information provided".to_owned());
            score += 0.3;
        }

        if cfg
            .natural_endings
            .iter()
            .any(|p| user_lower.contains(p.as_str()))
        {
            signals.push("Natural conversation ending detected".to_owned());
            score += 0.5;
        }

        let score = score.clamp(0.0, 1.0);
        let is_complete = score >= cfg.complete_threshold;
        let needs_followup = !is_complete && score >= cfg.followup_threshold;
        let recommended_action = if is_complete {
            RecommendedAction::Complete
        } else if needs_followup {
            RecommendedAction::Followup
        } else {
            RecommendedAction::Continue
        };

        CompletionStatus {
            score,
            signals,
            is_complete,
            needs_followup,
            recommended_action,
        }
    }

    /// Threshold at which a specialist closes out on its own.
    pub fn specialist_threshold(&self) -> f64 {
        self.config.completion.specialist_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> CompletionChecker {
        CompletionChecker::new(Arc::new(Config::default()))
    }

    fn state() -> ConversationState {
        ConversationState::seed("u", "c")
    }

    #[test]
    fn neutral_message_continues() {
        let status = checker().check("tell me about solar careers", &state(), "");
        assert_eq!(status.score, 0.0);
        assert_eq!(status.recommended_action, RecommendedAction::Continue);
    }

    #[test]
    fn gratitude_plus_natural_ending_completes() {
        let status = checker().check("Thanks, that's all I needed.", &state(), "");
        // 0.3 (closure) + 0.5 (natural ending) = 0.8.
        assert!(status.score >= 0.8 - 1e-9);
        assert!(status.is_complete);
        assert_eq!(status.recommended_action, RecommendedAction::Complete);
        assert_eq!(status.signals.len(), 2);
    }

    #[test]
    fn handoff_budget_contributes() {
        let mut s = state();
        s.handoff_count = 3;
        let status = checker().check("anything else?", &s, "");
        assert!((status.score - 0.4).abs() < 1e-9);
        assert!(status.needs_followup);
        assert_eq!(status.recommended_action, RecommendedAction::Followup);
    }

    #[test]
    fn contact_markers_in_response_contribute() {
        let status = checker().check("ok", &state(), "Email the program office to apply.");
        assert!((status.score - 0.3).abs() < 1e-9);
        assert!(status
            .signals
            .iter()
            .any(|s| s.contains("Contact information")));
    }

    #[test]
    fn score_clamps_at_one() {
        let mut s = state();
        s.handoff_count = 3;
        for _ in 0..2 {
            s.resource_recommendations.push(cc_domain::ResourceRecommendation {
                title: "t".into(),
                organization: "o".into(),
                url: None,
                notes: None,
                timestamp: chrono::Utc::now(),
            });
        }
        let status = checker().check(
            "thanks, that's all i needed, goodbye",
            &s,
            "contact us by email or phone",
        );
        assert!((status.score - 1.0).abs() < 1e-9);
        assert!(status.is_complete);
    }

    #[test]
    fn closure_keywords_count_once_per_type() {
        // Three closure keywords still contribute a single 0.3.
        let status = checker().check("thanks, perfect, goodbye", &state(), "");
        assert!((status.score - 0.3).abs() < 1e-9);
    }
}
