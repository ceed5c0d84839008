use serde::{Deserialize, Serialize};

use super::identity::strs;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Quality rubric
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Rubric weights for the five quality dimensions. Must sum to 1.0
/// (validated at startup).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityWeights {
    #[serde(default = "d_025")]
    pub clarity: f64,
    #[serde(default = "d_025")]
    pub actionability: f64,
    #[serde(default = "d_020")]
    pub personalization: f64,
    #[serde(default = "d_020")]
    pub source_citation: f64,
    #[serde(default = "d_010")]
    pub ej_awareness: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            clarity: 0.25,
            actionability: 0.25,
            personalization: 0.20,
            source_citation: 0.20,
            ej_awareness: 0.10,
        }
    }
}

impl QualityWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.clarity,
            self.actionability,
            self.personalization,
            self.source_citation,
            self.ej_awareness,
        ]
    }
}

/// One scored dimension: indicator lexicon + per-hit weight, capped at 10.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityLexicon {
    pub indicators: Vec<String>,
    pub per_hit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "d_clarity")]
    pub clarity: QualityLexicon,
    #[serde(default = "d_actionability")]
    pub actionability: QualityLexicon,
    #[serde(default = "d_personalization")]
    pub personalization: QualityLexicon,
    #[serde(default = "d_source_citation")]
    pub source_citation: QualityLexicon,
    #[serde(default = "d_ej_awareness")]
    pub ej_awareness: QualityLexicon,
    #[serde(default)]
    pub weights: QualityWeights,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            clarity: d_clarity(),
            actionability: d_actionability(),
            personalization: d_personalization(),
            source_citation: d_source_citation(),
            ej_awareness: d_ej_awareness(),
            weights: QualityWeights::default(),
        }
    }
}

fn d_025() -> f64 {
    0.25
}
fn d_020() -> f64 {
    0.20
}
fn d_010() -> f64 {
    0.10
}

fn d_clarity() -> QualityLexicon {
    QualityLexicon {
        indicators: strs(&["step", "first", "next", "then", "specific", "clear", "exactly"]),
        per_hit: 2.0,
    }
}

fn d_actionability() -> QualityLexicon {
    QualityLexicon {
        indicators: strs(&[
            "contact", "apply", "enroll", "visit", "call", "email", "website", "next step",
        ]),
        per_hit: 1.5,
    }
}

fn d_personalization() -> QualityLexicon {
    QualityLexicon {
        indicators: strs(&["your", "you", "based on", "given", "specific to", "tailored"]),
        per_hit: 1.5,
    }
}

fn d_source_citation() -> QualityLexicon {
    QualityLexicon {
        indicators: strs(&[
            "organization:",
            "contact:",
            "website:",
            "verified:",
            "source:",
            "phone:",
        ]),
        per_hit: 2.0,
    }
}

fn d_ej_awareness() -> QualityLexicon {
    QualityLexicon {
        indicators: strs(&[
            "environmental justice",
            "community",
            "equity",
            "frontline",
            "overburdened",
            "systemic",
            "barriers",
            "intersectional",
        ]),
        per_hit: 1.5,
    }
}
