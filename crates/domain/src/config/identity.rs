use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identity recognition
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One identity category with its keyword/context lexicons and the
/// barriers/strengths associated with it. Categories are an ordered
/// list: score ties resolve to the earliest declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityCategory {
    pub tag: String,
    /// Each hit scores 2.
    pub keywords: Vec<String>,
    /// Each hit scores 1.
    pub context_clues: Vec<String>,
    pub barriers: Vec<String>,
    pub strengths: Vec<String>,
}

/// Lexicons for the specific intersectionality markers layered on top
/// of the category scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntersectionalityMarkers {
    #[serde(default = "d_single_parent")]
    pub single_parent: Vec<String>,
    #[serde(default = "d_racial_ethnic_minority")]
    pub racial_ethnic_minority: Vec<String>,
    #[serde(default = "d_disability_status")]
    pub disability_status: Vec<String>,
}

impl Default for IntersectionalityMarkers {
    fn default() -> Self {
        Self {
            single_parent: d_single_parent(),
            racial_ethnic_minority: d_racial_ethnic_minority(),
            disability_status: d_disability_status(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_categories")]
    pub categories: Vec<IdentityCategory>,
    #[serde(default)]
    pub markers: IntersectionalityMarkers,
    /// Category assigned when a message produces no signal at all.
    #[serde(default = "d_fallback_identity")]
    pub fallback_identity: String,
    /// Default geographic context stamped on every profile.
    #[serde(default = "d_geography")]
    pub default_geography: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            markers: IntersectionalityMarkers::default(),
            fallback_identity: d_fallback_identity(),
            default_geography: d_geography(),
        }
    }
}

fn d_fallback_identity() -> String {
    "career_development".into()
}

fn d_geography() -> String {
    "Massachusetts".into()
}

fn d_single_parent() -> Vec<String> {
    strs(&["single mother", "single parent", "single father"])
}

fn d_racial_ethnic_minority() -> Vec<String> {
    strs(&["latina", "latino", "hispanic", "black", "african american"])
}

fn d_disability_status() -> Vec<String> {
    strs(&["disability", "disabled", "ptsd", "anxiety"])
}

fn default_categories() -> Vec<IdentityCategory> {
    vec![
        IdentityCategory {
            tag: "veteran".into(),
            keywords: strs(&[
                "military",
                "veteran",
                "navy",
                "army",
                "air force",
                "marines",
                "coast guard",
                "service",
                "deployment",
            ]),
            context_clues: strs(&["transition", "civilian", "mos", "rank", "base", "deployment"]),
            barriers: strs(&[
                "ptsd",
                "disability",
                "transition challenges",
                "civilian workplace",
            ]),
            strengths: strs(&["leadership", "discipline", "logistics", "security clearance"]),
        },
        IdentityCategory {
            tag: "international".into(),
            keywords: strs(&[
                "immigrant",
                "foreign",
                "visa",
                "h1b",
                "international",
                "credential",
                "degree from",
            ]),
            context_clues: strs(&[
                "country",
                "embassy",
                "work authorization",
                "english language",
            ]),
            barriers: strs(&[
                "credential recognition",
                "language barriers",
                "visa restrictions",
                "cultural adaptation",
            ]),
            strengths: strs(&[
                "multilingual",
                "diverse perspective",
                "international experience",
                "adaptability",
            ]),
        },
        IdentityCategory {
            tag: "environmental_justice".into(),
            keywords: strs(&[
                "community",
                "environmental justice",
                "ej",
                "frontline",
                "pollution",
                "equity",
            ]),
            context_clues: strs(&[
                "organizing",
                "advocacy",
                "grassroots",
                "systemic",
                "cumulative impact",
            ]),
            barriers: strs(&[
                "systemic racism",
                "economic inequality",
                "health disparities",
                "displacement",
            ]),
            strengths: strs(&[
                "community knowledge",
                "organizing skills",
                "advocacy experience",
                "cultural competency",
            ]),
        },
        IdentityCategory {
            tag: "career_development".into(),
            keywords: strs(&["resume", "skills", "training", "career", "job search", "transition"]),
            context_clues: strs(&[
                "experience",
                "education",
                "career change",
                "professional development",
            ]),
            barriers: strs(&[
                "skills gap",
                "career uncertainty",
                "networking challenges",
                "training costs",
            ]),
            strengths: strs(&[
                "motivation",
                "learning readiness",
                "professional experience",
                "growth mindset",
            ]),
        },
    ]
}

pub(crate) fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
