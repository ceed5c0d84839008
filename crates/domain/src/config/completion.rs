use serde::{Deserialize, Serialize};

use super::identity::strs;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Completion detection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Gratitude / closure keywords in the user message (+0.3 once).
    #[serde(default = "d_closure_keywords")]
    pub closure_keywords: Vec<String>,
    /// Natural-ending phrases (+0.5 once).
    #[serde(default = "d_natural_endings")]
    pub natural_endings: Vec<String>,
    /// Contact markers in the specialist response (+0.3 once).
    #[serde(default = "d_contact_markers")]
    pub contact_markers: Vec<String>,
    /// Handoff count at which completion gains +0.4.
    #[serde(default = "d_3")]
    pub handoff_signal_at: u32,
    /// Resource count at which completion gains +0.2.
    #[serde(default = "d_2us")]
    pub resource_signal_at: usize,
    /// Score at or above which the supervisor completes the turn.
    #[serde(default = "d_07")]
    pub complete_threshold: f64,
    /// Score at or above which a follow-up is recommended.
    #[serde(default = "d_03")]
    pub followup_threshold: f64,
    /// Specialists close out earlier than the supervisor does.
    /// Intentionally distinct from `complete_threshold`.
    #[serde(default = "d_06")]
    pub specialist_threshold: f64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            closure_keywords: d_closure_keywords(),
            natural_endings: d_natural_endings(),
            contact_markers: d_contact_markers(),
            handoff_signal_at: 3,
            resource_signal_at: 2,
            complete_threshold: 0.7,
            followup_threshold: 0.3,
            specialist_threshold: 0.6,
        }
    }
}

fn d_3() -> u32 {
    3
}
fn d_2us() -> usize {
    2
}
fn d_07() -> f64 {
    0.7
}
fn d_06() -> f64 {
    0.6
}
fn d_03() -> f64 {
    0.3
}

fn d_closure_keywords() -> Vec<String> {
    strs(&[
        "thank you",
        "thanks",
        "that's helpful",
        "that helps",
        "perfect",
        "great",
        "sounds good",
        "i'll look into",
        "i'll contact",
        "i'll apply",
        "that's all",
        "no more questions",
        "goodbye",
        "bye",
        "talk later",
    ])
}

fn d_natural_endings() -> Vec<String> {
    strs(&["that's all i needed", "no other questions", "i'm all set"])
}

fn d_contact_markers() -> Vec<String> {
    strs(&["contact", "email", "phone", "apply", "website"])
}
