//! Specialist routing with confidence scoring.
//!
//! Scores every configured specialist against the identity profile and
//! picks the best match (ties to the earliest-declared specialist).
//! Score table:
//! - primary identity in primary focus +5, in secondary focus +3
//! - each secondary identity in primary focus +3, in secondary focus +2
//! - EJ-oriented specialist +2 when more than one intersectionality factor
//! - generalists +1 when more than one secondary identity

use std::sync::Arc;

use cc_domain::config::{Config, SpecialistCapability};
use cc_domain::{IdentityProfile, RoutingConfidence, RoutingDecision};

pub struct RoutingEngine {
    config: Arc<Config>,
}

impl RoutingEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Produce a routing decision for an identity profile.
    pub fn decide(&self, identity: &IdentityProfile) -> RoutingDecision {
        let specialists = &self.config.routing.specialists;
        if specialists.is_empty() {
            return RoutingDecision::uncertain(&self.config.routing.fallback_specialist);
        }

        let scores: Vec<u32> = specialists
            .iter()
            .map(|s| compatibility_score(s, identity))
            .collect();

        // Argmax with ties resolving to the earliest declaration.
        let mut best_idx = 0usize;
        for (idx, score) in scores.iter().enumerate() {
            if *score > scores[best_idx] {
                best_idx = idx;
            }
        }
        let best = &specialists[best_idx];
        let best_score = scores[best_idx];
        let confidence = bucket_confidence(best_score);

        // Next two alternatives by score (> 0), stable on ties.
        let mut ranked: Vec<(usize, u32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(idx, score)| *idx != best_idx && *score > 0)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        let alternatives: Vec<String> = ranked
            .into_iter()
            .take(2)
            .map(|(idx, _)| specialists[idx].id.clone())
            .collect();

        let reasoning = routing_reasoning(best, identity, best_score);

        tracing::debug!(
            specialist = %best.id,
            score = best_score,
            confidence = %confidence,
            "routing decision"
        );

        RoutingDecision {
            specialist_assigned: best.id.clone(),
            confidence_level: confidence,
            reasoning,
            alternatives,
            recommended_tools: best.tools.clone(),
            expected_outcome: format!(
                "Comprehensive {} support with personalized recommendations",
                identity.primary_identity
            ),
            success_metrics: best.success_indicators.clone(),
        }
    }
}

fn compatibility_score(specialist: &SpecialistCapability, identity: &IdentityProfile) -> u32 {
    let mut score = 0u32;

    // A zero-confidence fallback identity carries no real signal, so it
    // earns no primary-focus match; such cases bucket as uncertain and
    // reach the human-loop coordinator instead of a confident handoff.
    let primary_is_real = identity.confidence_score > 0.0;

    if primary_is_real
        && specialist
            .primary_focus
            .contains(&identity.primary_identity)
    {
        score += 5;
    } else if primary_is_real
        && specialist
            .secondary_focus
            .contains(&identity.primary_identity)
    {
        score += 3;
    }

    for secondary in &identity.secondary_identities {
        if specialist.primary_focus.contains(secondary) {
            score += 3;
        } else if specialist.secondary_focus.contains(secondary) {
            score += 2;
        }
    }

    if specialist.ej_oriented && identity.intersectionality_factors.len() > 1 {
        score += 2;
    }

    if specialist.generalist && identity.secondary_identities.len() > 1 {
        score += 1;
    }

    score
}

fn bucket_confidence(score: u32) -> RoutingConfidence {
    if score >= 6 {
        RoutingConfidence::High
    } else if score >= 4 {
        RoutingConfidence::Medium
    } else if score >= 2 {
        RoutingConfidence::Low
    } else {
        RoutingConfidence::Uncertain
    }
}

fn routing_reasoning(
    specialist: &SpecialistCapability,
    identity: &IdentityProfile,
    score: u32,
) -> String {
    let mut reasoning = format!("Routed to {} because:\n", specialist.display_name);
    reasoning.push_str(&format!(
        "- Primary identity '{}' aligns with specialist expertise\n",
        identity.primary_identity
    ));
    if identity.intersectionality_factors.len() > 1 {
        reasoning
            .push_str("- Multiple intersecting identities detected, requiring specialized support\n");
    }
    if score >= 6 {
        reasoning.push_str("- High confidence match based on keyword analysis and context\n");
    } else if score >= 4 {
        reasoning.push_str("- Moderate confidence match with good capability alignment\n");
    } else {
        reasoning.push_str("- Best available match, may require coordination with other specialists\n");
    }
    reasoning
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RoutingEngine {
        RoutingEngine::new(Arc::new(Config::default()))
    }

    fn profile(primary: &str) -> IdentityProfile {
        IdentityProfile {
            primary_identity: primary.to_owned(),
            secondary_identities: Vec::new(),
            intersectionality_factors: Vec::new(),
            barriers_identified: Vec::new(),
            strengths_identified: Vec::new(),
            geographic_context: "Massachusetts".into(),
            confidence_score: 0.5,
        }
    }

    #[test]
    fn veteran_routes_to_veterans_specialist() {
        let decision = engine().decide(&profile("veteran"));
        assert_eq!(decision.specialist_assigned, "veterans");
        // Bare primary-focus match scores 5 → medium.
        assert_eq!(decision.confidence_level, RoutingConfidence::Medium);
        assert!(decision.reasoning.contains("Veterans Transition Specialist"));
    }

    #[test]
    fn secondary_identity_raises_confidence_to_high() {
        let mut identity = profile("veteran");
        identity.secondary_identities = vec!["career_development".into()];
        let decision = engine().decide(&identity);
        assert_eq!(decision.specialist_assigned, "veterans");
        // 5 (primary) but career adds nothing to veterans; career
        // specialist gets 3 for the secondary. Veterans still wins.
        assert!(decision.alternatives.contains(&"career".to_owned()));
    }

    #[test]
    fn intersectionality_bonus_favors_justice_specialist() {
        let mut identity = profile("environmental_justice");
        identity.intersectionality_factors =
            vec!["multiple_identities".into(), "single_parent".into()];
        let decision = engine().decide(&identity);
        assert_eq!(decision.specialist_assigned, "justice");
        // 5 primary + 2 intersectionality = 7 → high.
        assert_eq!(decision.confidence_level, RoutingConfidence::High);
    }

    #[test]
    fn unknown_identity_is_uncertain() {
        let decision = engine().decide(&profile("gardener"));
        assert_eq!(decision.confidence_level, RoutingConfidence::Uncertain);
        // All scores zero: earliest-declared specialist wins the tie.
        assert_eq!(decision.specialist_assigned, "career");
        assert!(decision.alternatives.is_empty());
    }

    #[test]
    fn zero_confidence_fallback_is_uncertain() {
        // A fallback profile names a category every specialist table
        // knows, but with no signal behind it routing must not claim a
        // confident match.
        let identity = IdentityProfile::fallback("career_development", "Massachusetts");
        let decision = engine().decide(&identity);
        assert_eq!(decision.confidence_level, RoutingConfidence::Uncertain);
    }

    #[test]
    fn generalist_bonus_applies_with_two_secondaries() {
        let mut identity = profile("veteran");
        identity.secondary_identities =
            vec!["career_development".into(), "environmental_justice".into()];
        let decision = engine().decide(&identity);
        // career: 3 (career_dev primary-focus) + 1 generalist = 4.
        // justice: 3 (ej primary-focus) + 1 generalist = 4.
        // veterans: 5. Veterans still assigned; both appear as alternatives.
        assert_eq!(decision.specialist_assigned, "veterans");
        assert_eq!(
            decision.alternatives,
            vec!["career".to_owned(), "justice".to_owned()]
        );
    }

    #[test]
    fn decision_carries_tools_and_metrics() {
        let decision = engine().decide(&profile("international"));
        assert!(decision
            .recommended_tools
            .contains(&"credential_evaluation".to_owned()));
        assert!(decision
            .success_metrics
            .contains(&"credentials_evaluated".to_owned()));
        assert!(decision.expected_outcome.contains("international"));
    }

    #[test]
    fn confidence_buckets() {
        assert_eq!(bucket_confidence(6), RoutingConfidence::High);
        assert_eq!(bucket_confidence(5), RoutingConfidence::Medium);
        assert_eq!(bucket_confidence(4), RoutingConfidence::Medium);
        assert_eq!(bucket_confidence(3), RoutingConfidence::Low);
        assert_eq!(bucket_confidence(2), RoutingConfidence::Low);
        assert_eq!(bucket_confidence(1), RoutingConfidence::Uncertain);
        assert_eq!(bucket_confidence(0), RoutingConfidence::Uncertain);
    }
}
