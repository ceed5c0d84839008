//! Assessment types produced by the intelligence modules each turn:
//! the identity profile, the routing decision, and the quality metrics.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intelligence level
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bucketed label derived from the overall quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceLevel {
    Basic,
    #[default]
    Developing,
    Proficient,
    Advanced,
    Exceptional,
}

impl IntelligenceLevel {
    /// Bucket an overall quality score (0–10).
    pub fn from_overall(overall: f64) -> Self {
        if overall >= 8.5 {
            IntelligenceLevel::Exceptional
        } else if overall >= 7.0 {
            IntelligenceLevel::Advanced
        } else if overall >= 5.0 {
            IntelligenceLevel::Proficient
        } else if overall >= 3.0 {
            IntelligenceLevel::Developing
        } else {
            IntelligenceLevel::Basic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntelligenceLevel::Basic => "basic",
            IntelligenceLevel::Developing => "developing",
            IntelligenceLevel::Proficient => "proficient",
            IntelligenceLevel::Advanced => "advanced",
            IntelligenceLevel::Exceptional => "exceptional",
        }
    }
}

impl fmt::Display for IntelligenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identity profile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identity recognition output, including intersectionality markers and
/// the barriers/strengths aggregated from the matched categories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub primary_identity: String,
    #[serde(default)]
    pub secondary_identities: Vec<String>,
    #[serde(default)]
    pub intersectionality_factors: Vec<String>,
    #[serde(default)]
    pub barriers_identified: Vec<String>,
    #[serde(default)]
    pub strengths_identified: Vec<String>,
    pub geographic_context: String,
    pub confidence_score: f64,
}

impl IdentityProfile {
    /// Zero-confidence fallback used when recognition has nothing to work
    /// with (empty message, internal error).
    pub fn fallback(primary: &str, geography: &str) -> Self {
        Self {
            primary_identity: primary.to_owned(),
            secondary_identities: Vec::new(),
            intersectionality_factors: Vec::new(),
            barriers_identified: Vec::new(),
            strengths_identified: Vec::new(),
            geographic_context: geography.to_owned(),
            confidence_score: 0.0,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Routing decision
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bucketed routing confidence derived from the specialist compatibility
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingConfidence {
    High,
    Medium,
    Low,
    Uncertain,
}

impl RoutingConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingConfidence::High => "high",
            RoutingConfidence::Medium => "medium",
            RoutingConfidence::Low => "low",
            RoutingConfidence::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for RoutingConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Node id of the chosen specialist.
    pub specialist_assigned: String,
    pub confidence_level: RoutingConfidence,
    pub reasoning: String,
    /// Next-best specialists by score (score > 0), best first.
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub recommended_tools: Vec<String>,
    pub expected_outcome: String,
    #[serde(default)]
    pub success_metrics: Vec<String>,
}

impl RoutingDecision {
    /// Minimal fallback when the routing engine itself fails.
    pub fn uncertain(specialist: &str) -> Self {
        Self {
            specialist_assigned: specialist.to_owned(),
            confidence_level: RoutingConfidence::Uncertain,
            reasoning: "routing fallback: no compatibility signal".to_owned(),
            alternatives: Vec::new(),
            recommended_tools: Vec::new(),
            expected_outcome: String::new(),
            success_metrics: Vec::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Quality metrics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Five-dimension response quality assessment. `overall` is always the
/// fixed weighted sum of the components, rounded half-to-even at 0.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub clarity: f64,
    pub actionability: f64,
    pub personalization: f64,
    pub source_citation: f64,
    pub ej_awareness: f64,
    pub overall: f64,
    pub intelligence_level: IntelligenceLevel,
}

/// Fixed rubric weights: clarity 0.25, actionability 0.25,
/// personalization 0.20, source citation 0.20, EJ awareness 0.10.
pub const QUALITY_WEIGHTS: [f64; 5] = [0.25, 0.25, 0.20, 0.20, 0.10];

impl QualityMetrics {
    /// Build from component scores (each expected in [0, 10]).
    pub fn from_components(
        clarity: f64,
        actionability: f64,
        personalization: f64,
        source_citation: f64,
        ej_awareness: f64,
    ) -> Self {
        let weighted = clarity * QUALITY_WEIGHTS[0]
            + actionability * QUALITY_WEIGHTS[1]
            + personalization * QUALITY_WEIGHTS[2]
            + source_citation * QUALITY_WEIGHTS[3]
            + ej_awareness * QUALITY_WEIGHTS[4];
        let overall = round_tenth(weighted);
        Self {
            clarity,
            actionability,
            personalization,
            source_citation,
            ej_awareness,
            overall,
            intelligence_level: IntelligenceLevel::from_overall(overall),
        }
    }

    /// Neutral substitute when the analyzer itself fails: overall 5.0.
    pub fn neutral() -> Self {
        Self::from_components(5.0, 5.0, 5.0, 5.0, 5.0)
    }
}

/// Round half to even at one decimal place.
fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intelligence_buckets() {
        assert_eq!(IntelligenceLevel::from_overall(9.2), IntelligenceLevel::Exceptional);
        assert_eq!(IntelligenceLevel::from_overall(8.5), IntelligenceLevel::Exceptional);
        assert_eq!(IntelligenceLevel::from_overall(7.0), IntelligenceLevel::Advanced);
        assert_eq!(IntelligenceLevel::from_overall(5.0), IntelligenceLevel::Proficient);
        assert_eq!(IntelligenceLevel::from_overall(3.0), IntelligenceLevel::Developing);
        assert_eq!(IntelligenceLevel::from_overall(2.9), IntelligenceLevel::Basic);
        assert_eq!(IntelligenceLevel::from_overall(0.0), IntelligenceLevel::Basic);
    }

    #[test]
    fn overall_is_weighted_sum() {
        let q = QualityMetrics::from_components(10.0, 10.0, 10.0, 10.0, 10.0);
        assert!((q.overall - 10.0).abs() < 1e-6);
        assert_eq!(q.intelligence_level, IntelligenceLevel::Exceptional);

        let q = QualityMetrics::from_components(8.0, 6.0, 4.0, 2.0, 0.0);
        // 2.0 + 1.5 + 0.8 + 0.4 + 0.0 = 4.7
        assert!((q.overall - 4.7).abs() < 1e-6);
        assert_eq!(q.intelligence_level, IntelligenceLevel::Developing);
    }

    #[test]
    fn rounding_is_half_to_even() {
        // 1.25 rounds to 1.2 (even), 1.35 rounds to 1.4.
        assert!((round_tenth(1.25) - 1.2).abs() < 1e-9);
        assert!((round_tenth(1.35) - 1.4).abs() < 1e-9);
    }

    #[test]
    fn neutral_is_proficient_boundary() {
        let q = QualityMetrics::neutral();
        assert!((q.overall - 5.0).abs() < 1e-6);
        assert_eq!(q.intelligence_level, IntelligenceLevel::Proficient);
    }
}
