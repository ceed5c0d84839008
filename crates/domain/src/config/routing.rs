use serde::{Deserialize, Serialize};

use super::identity::strs;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Specialist capability table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A specialist's routing profile. The table is ordered: compatibility
/// ties resolve to the earliest declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistCapability {
    /// Node id (`career`, `veterans`, `international`, `justice`).
    pub id: String,
    /// Human-facing name used in reasoning text and message metadata.
    pub display_name: String,
    /// Identity tags scoring +5 (primary) / +3 (secondary identity).
    pub primary_focus: Vec<String>,
    /// Identity tags scoring +3 (primary) / +2 (secondary identity).
    pub secondary_focus: Vec<String>,
    pub tools: Vec<String>,
    pub success_indicators: Vec<String>,
    /// High-coordination generalists earn +1 on multi-identity cases.
    #[serde(default)]
    pub generalist: bool,
    /// The EJ-oriented specialist earns +2 when more than one
    /// intersectionality factor is present.
    #[serde(default)]
    pub ej_oriented: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_specialists")]
    pub specialists: Vec<SpecialistCapability>,
    /// Handoff target when the supervisor's LLM call fails outright.
    #[serde(default = "d_fallback_specialist")]
    pub fallback_specialist: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            specialists: default_specialists(),
            fallback_specialist: d_fallback_specialist(),
        }
    }
}

impl RoutingConfig {
    /// Look up a specialist by node id.
    pub fn specialist(&self, id: &str) -> Option<&SpecialistCapability> {
        self.specialists.iter().find(|s| s.id == id)
    }

    /// True if `id` names a known specialist node.
    pub fn is_specialist(&self, id: &str) -> bool {
        self.specialist(id).is_some()
    }
}

fn d_fallback_specialist() -> String {
    "career".into()
}

fn default_specialists() -> Vec<SpecialistCapability> {
    vec![
        SpecialistCapability {
            id: "career".into(),
            display_name: "Career Resources Analyst".into(),
            primary_focus: strs(&[
                "career_development",
                "skills_analysis",
                "resume_optimization",
            ]),
            secondary_focus: strs(&[
                "training_programs",
                "job_matching",
                "professional_development",
            ]),
            tools: strs(&[
                "resume_analysis",
                "skills_gap_analysis",
                "job_matching",
                "training_search",
            ]),
            success_indicators: strs(&[
                "resume_improved",
                "skills_identified",
                "training_found",
                "jobs_matched",
            ]),
            generalist: true,
            ej_oriented: false,
        },
        SpecialistCapability {
            id: "veterans".into(),
            display_name: "Veterans Transition Specialist".into(),
            primary_focus: strs(&["veteran", "military_transition", "veteran_benefits"]),
            secondary_focus: strs(&[
                "leadership_roles",
                "security_positions",
                "logistics_careers",
            ]),
            tools: strs(&[
                "mos_translation",
                "veteran_programs",
                "skill_translation",
                "military_career_mapping",
            ]),
            success_indicators: strs(&[
                "mos_translated",
                "veteran_programs_found",
                "transition_plan_created",
            ]),
            generalist: false,
            ej_oriented: false,
        },
        SpecialistCapability {
            id: "international".into(),
            display_name: "International Credentials Specialist".into(),
            primary_focus: strs(&["international", "credential_evaluation", "visa_support"]),
            secondary_focus: strs(&[
                "language_support",
                "cultural_integration",
                "international_experience",
            ]),
            tools: strs(&[
                "credential_evaluation",
                "visa_guidance",
                "international_programs",
                "language_resources",
            ]),
            success_indicators: strs(&[
                "credentials_evaluated",
                "visa_pathway_identified",
                "integration_support_found",
            ]),
            generalist: false,
            ej_oriented: false,
        },
        SpecialistCapability {
            id: "justice".into(),
            display_name: "Environmental Justice Specialist".into(),
            primary_focus: strs(&[
                "environmental_justice",
                "community_organizing",
                "equity_advocacy",
            ]),
            secondary_focus: strs(&[
                "community_benefits",
                "grassroots_organizing",
                "policy_advocacy",
            ]),
            tools: strs(&[
                "ej_community_search",
                "organizing_resources",
                "policy_analysis",
                "community_programs",
            ]),
            success_indicators: strs(&[
                "community_resources_found",
                "organizing_support_provided",
                "equity_pathways_identified",
            ]),
            generalist: true,
            ej_oriented: true,
        },
    ]
}
