use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Engine limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Handoff count at which the supervisor force-completes a turn.
    #[serde(default = "d_3")]
    pub max_handoffs: u32,
    /// Handoff count at which a specialist stops the round-trip and
    /// gives its comprehensive final response instead.
    #[serde(default = "d_2")]
    pub specialist_handoff_cap: u32,
    /// Hard cap on node transitions per turn. A turn that hits this is
    /// a bug, not a workload.
    #[serde(default = "d_25")]
    pub max_steps_per_turn: u32,
    /// Default deadline for tool invocations (ms), overridable per tool.
    #[serde(default = "d_20000")]
    pub tool_timeout_ms: u64,
    /// Seed prompt when a turn starts with no user message on record.
    #[serde(default = "d_seed_prompt")]
    pub default_user_prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_handoffs: 3,
            specialist_handoff_cap: 2,
            max_steps_per_turn: 25,
            tool_timeout_ms: 20_000,
            default_user_prompt: d_seed_prompt(),
        }
    }
}

fn d_3() -> u32 {
    3
}
fn d_2() -> u32 {
    2
}
fn d_25() -> u32 {
    25
}
fn d_20000() -> u64 {
    20_000
}

fn d_seed_prompt() -> String {
    "I need help with climate career opportunities".into()
}
