//! Five-dimension response quality scoring.
//!
//! Each dimension counts lexicon hits in the response text at its
//! configured per-hit weight, capped at 10; the overall score is the
//! fixed weighted sum. Pure function of its inputs — identical on
//! replay.

use std::sync::Arc;

use cc_domain::config::{Config, QualityLexicon};
use cc_domain::{IdentityProfile, QualityMetrics};

pub struct QualityAnalyzer {
    config: Arc<Config>,
}

impl QualityAnalyzer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Score a response. The identity profile and tool list are part of
    /// the scoring contract (they travel with every call site) though
    /// the current rubric derives all five dimensions from the text.
    pub fn analyze(
        &self,
        response: &str,
        _identity: &IdentityProfile,
        _tools_used: &[String],
    ) -> QualityMetrics {
        let cfg = &self.config.quality;
        let text = response.to_lowercase();

        let metrics = QualityMetrics::from_components(
            dimension_score(&cfg.clarity, &text),
            dimension_score(&cfg.actionability, &text),
            dimension_score(&cfg.personalization, &text),
            dimension_score(&cfg.source_citation, &text),
            dimension_score(&cfg.ej_awareness, &text),
        );

        tracing::debug!(
            overall = metrics.overall,
            level = %metrics.intelligence_level,
            "quality analysis"
        );
        metrics
    }
}

fn dimension_score(lexicon: &QualityLexicon, text: &str) -> f64 {
    let hits = lexicon
        .indicators
        .iter()
        .filter(|i| text.contains(i.as_str()))
        .count();
    (hits as f64 * lexicon.per_hit).min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::IntelligenceLevel;

    fn analyzer() -> QualityAnalyzer {
        QualityAnalyzer::new(Arc::new(Config::default()))
    }

    fn identity() -> IdentityProfile {
        IdentityProfile::fallback("career_development", "Massachusetts")
    }

    #[test]
    fn empty_response_scores_zero() {
        let q = analyzer().analyze("", &identity(), &[]);
        assert_eq!(q.overall, 0.0);
        assert_eq!(q.intelligence_level, IntelligenceLevel::Basic);
    }

    #[test]
    fn rich_response_scores_high() {
        let response = "First, here is a clear step-by-step plan specific to your background. \
                        Next, call or email the program office, then contact them and apply \
                        on their website. Organization: Climate Careers Hub. \
                        Contact: hub@example.org. Website: climatecareershub.example. \
                        Verified: 2025. This addresses systemic barriers in frontline \
                        community equity work.";
        let q = analyzer().analyze(response, &identity(), &[]);
        assert!(q.overall >= 7.0, "overall was {}", q.overall);
        assert!(q.clarity >= 6.0);
        assert!(q.source_citation >= 6.0);
    }

    #[test]
    fn dimensions_cap_at_ten() {
        // Seven clarity indicators at weight 2 would be 14 uncapped.
        let response = "step first next then specific clear exactly";
        let q = analyzer().analyze(response, &identity(), &[]);
        assert_eq!(q.clarity, 10.0);
    }

    #[test]
    fn overall_matches_weighted_sum_exactly() {
        let response = "your step contact";
        let q = analyzer().analyze(response, &identity(), &[]);
        let expected = 0.25 * q.clarity
            + 0.25 * q.actionability
            + 0.20 * q.personalization
            + 0.20 * q.source_citation
            + 0.10 * q.ej_awareness;
        assert!((q.overall - (expected * 10.0).round_ties_even() / 10.0).abs() < 1e-6);
    }

    #[test]
    fn analysis_is_deterministic() {
        let response = "Contact the organization and apply; your next step is specific training.";
        let a = analyzer().analyze(response, &identity(), &[]);
        let b = analyzer().analyze(response, &identity(), &[]);
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.clarity, b.clarity);
    }
}
