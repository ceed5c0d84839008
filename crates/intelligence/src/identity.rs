//! Identity recognition with intersectionality support.
//!
//! Scores each configured category against the message (2 per keyword
//! hit, 1 per context-clue hit), picks the primary by highest score
//! (ties to the earliest-declared category), and aggregates the
//! barriers/strengths of every matched category.

use std::sync::Arc;

use cc_domain::config::Config;
use cc_domain::IdentityProfile;

pub struct IdentityRecognizer {
    config: Arc<Config>,
}

impl IdentityRecognizer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Derive an identity profile from a user message. Never fails:
    /// a message with no signal yields the configured fallback category
    /// at zero confidence.
    pub fn analyze(&self, message: &str) -> IdentityProfile {
        let cfg = &self.config.identity;
        let text = message.to_lowercase();

        if text.trim().is_empty() {
            return IdentityProfile::fallback(&cfg.fallback_identity, &cfg.default_geography);
        }

        // Per-category scores, in declaration order.
        let scores: Vec<(usize, u32)> = cfg
            .categories
            .iter()
            .enumerate()
            .map(|(idx, cat)| {
                let keyword_hits = cat.keywords.iter().filter(|k| text.contains(k.as_str())).count();
                let context_hits = cat
                    .context_clues
                    .iter()
                    .filter(|c| text.contains(c.as_str()))
                    .count();
                (idx, 2 * keyword_hits as u32 + context_hits as u32)
            })
            .collect();

        let total: u32 = scores.iter().map(|(_, s)| s).sum();
        if total == 0 {
            return IdentityProfile::fallback(&cfg.fallback_identity, &cfg.default_geography);
        }

        // Primary: strictly-greater comparison keeps the earliest on ties.
        let (primary_idx, _) = scores
            .iter()
            .copied()
            .fold((0usize, 0u32), |(best_idx, best), (idx, score)| {
                if score > best {
                    (idx, score)
                } else {
                    (best_idx, best)
                }
            });

        let primary = cfg.categories[primary_idx].tag.clone();
        let secondary: Vec<String> = scores
            .iter()
            .filter(|(idx, score)| *score > 0 && *idx != primary_idx)
            .map(|(idx, _)| cfg.categories[*idx].tag.clone())
            .collect();

        // Intersectionality: a generic multi-identity marker plus the
        // specific marker lexicons.
        let mut factors = Vec::new();
        if !secondary.is_empty() {
            factors.push("multiple_identities".to_owned());
        }
        if cfg.markers.single_parent.iter().any(|m| text.contains(m.as_str())) {
            factors.push("single_parent".to_owned());
        }
        if cfg
            .markers
            .racial_ethnic_minority
            .iter()
            .any(|m| text.contains(m.as_str()))
        {
            factors.push("racial_ethnic_minority".to_owned());
        }
        if cfg
            .markers
            .disability_status
            .iter()
            .any(|m| text.contains(m.as_str()))
        {
            factors.push("disability_status".to_owned());
        }

        // Barriers/strengths: union across the matched categories,
        // first occurrence wins the position.
        let mut barriers = Vec::new();
        let mut strengths = Vec::new();
        let matched = std::iter::once(primary_idx)
            .chain(scores.iter().filter(|(idx, score)| *score > 0 && *idx != primary_idx).map(|(idx, _)| *idx));
        for idx in matched {
            let cat = &cfg.categories[idx];
            for b in &cat.barriers {
                if !barriers.contains(b) {
                    barriers.push(b.clone());
                }
            }
            for s in &cat.strengths {
                if !strengths.contains(s) {
                    strengths.push(s.clone());
                }
            }
        }

        let confidence = (f64::from(total) / 10.0).min(1.0);

        tracing::debug!(
            primary = %primary,
            secondaries = secondary.len(),
            confidence,
            "identity analysis"
        );

        IdentityProfile {
            primary_identity: primary,
            secondary_identities: secondary,
            intersectionality_factors: factors,
            barriers_identified: barriers,
            strengths_identified: strengths,
            geographic_context: cfg.default_geography.clone(),
            confidence_score: confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recognizer() -> IdentityRecognizer {
        IdentityRecognizer::new(Arc::new(Config::default()))
    }

    #[test]
    fn veteran_message_is_recognized() {
        let profile = recognizer().analyze("I'm a military veteran interested in clean energy careers");
        assert_eq!(profile.primary_identity, "veteran");
        // "military" + "veteran" keywords = 4, plus "career" hits the
        // career_development category.
        assert!(profile.confidence_score >= 0.4);
        assert!(profile.strengths_identified.contains(&"leadership".to_owned()));
    }

    #[test]
    fn empty_message_falls_back_at_zero_confidence() {
        let profile = recognizer().analyze("   ");
        assert_eq!(profile.primary_identity, "career_development");
        assert_eq!(profile.confidence_score, 0.0);
        assert!(profile.secondary_identities.is_empty());
    }

    #[test]
    fn no_signal_falls_back() {
        let profile = recognizer().analyze("what is the weather like");
        assert_eq!(profile.primary_identity, "career_development");
        assert_eq!(profile.confidence_score, 0.0);
    }

    #[test]
    fn secondary_identities_and_multi_identity_factor() {
        let profile = recognizer()
            .analyze("I'm a veteran and an immigrant looking at a career transition");
        assert_eq!(profile.primary_identity, "veteran");
        assert!(profile
            .secondary_identities
            .contains(&"international".to_owned()));
        assert!(profile
            .intersectionality_factors
            .contains(&"multiple_identities".to_owned()));
    }

    #[test]
    fn specific_markers_are_detected() {
        let profile =
            recognizer().analyze("I'm a single mother with a disability looking for training");
        assert!(profile
            .intersectionality_factors
            .contains(&"single_parent".to_owned()));
        assert!(profile
            .intersectionality_factors
            .contains(&"disability_status".to_owned()));
    }

    #[test]
    fn matching_is_case_folded() {
        let upper = recognizer().analyze("MILITARY VETERAN");
        assert_eq!(upper.primary_identity, "veteran");
    }

    #[test]
    fn confidence_caps_at_one() {
        let profile = recognizer().analyze(
            "military veteran navy army air force marines coast guard service deployment \
             transition civilian mos rank base",
        );
        assert!((profile.confidence_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn barriers_are_deduplicated() {
        let profile = recognizer().analyze("veteran with ptsd changing career");
        let ptsd_count = profile
            .barriers_identified
            .iter()
            .filter(|b| b.as_str() == "ptsd")
            .count();
        assert_eq!(ptsd_count, 1);
    }
}
