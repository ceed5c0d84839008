use serde::{Deserialize, Serialize};

use super::identity::strs;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Human-in-the-loop thresholds
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanLoopConfig {
    /// Overall quality below this triggers a medium-priority review.
    #[serde(default = "d_50")]
    pub quality_threshold: f64,
    /// Handoff count at or above this triggers a high-priority review.
    #[serde(default = "d_4")]
    pub handoff_threshold: u32,
    /// Error-log length at or above this triggers an urgent review.
    #[serde(default = "d_2us")]
    pub error_threshold: usize,
    /// Keywords in the user message that force an urgent review.
    #[serde(default = "d_sensitive_keywords")]
    pub sensitive_keywords: Vec<String>,
    /// Who gets paged on high/urgent escalations.
    #[serde(default = "d_escalation_contact")]
    pub escalation_contact: String,
    /// Recommended wait before re-checking (seconds).
    #[serde(default = "d_60")]
    pub urgent_wait_secs: u64,
    #[serde(default = "d_300")]
    pub default_wait_secs: u64,
}

impl Default for HumanLoopConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 5.0,
            handoff_threshold: 4,
            error_threshold: 2,
            sensitive_keywords: d_sensitive_keywords(),
            escalation_contact: d_escalation_contact(),
            urgent_wait_secs: 60,
            default_wait_secs: 300,
        }
    }
}

fn d_50() -> f64 {
    5.0
}
fn d_4() -> u32 {
    4
}
fn d_2us() -> usize {
    2
}
fn d_60() -> u64 {
    60
}
fn d_300() -> u64 {
    300
}

fn d_sensitive_keywords() -> Vec<String> {
    strs(&[
        "discrimination",
        "harassment",
        "mental health",
        "crisis",
        "emergency",
    ])
}

fn d_escalation_contact() -> String {
    "review-team@climatecompass.example".into()
}
