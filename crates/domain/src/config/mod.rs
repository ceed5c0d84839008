//! Process-wide configuration, loaded once at startup and shared as
//! `Arc<Config>`. Every section is `#[serde(default)]` so a missing or
//! partial `config.toml` yields the built-in tables, which mirror the
//! deployed lexicons and capability matrix.

mod completion;
mod engine;
mod human_loop;
mod identity;
mod llm;
mod quality;
mod routing;
mod statestore;

pub use completion::*;
pub use engine::*;
pub use human_loop::*;
pub use identity::*;
pub use llm::*;
pub use quality::*;
pub use routing::*;
pub use statestore::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub human_loop: HumanLoopConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Sanity-check the loaded tables. Errors make startup abort;
    /// warnings are logged and tolerated.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.identity.categories.is_empty() {
            issues.push(ConfigIssue::error("identity.categories is empty"));
        }
        if !self
            .identity
            .categories
            .iter()
            .any(|c| c.tag == self.identity.fallback_identity)
        {
            issues.push(ConfigIssue::error(format!(
                "identity.fallback_identity '{}' is not a declared category",
                self.identity.fallback_identity
            )));
        }

        if self.routing.specialists.is_empty() {
            issues.push(ConfigIssue::error("routing.specialists is empty"));
        }
        if !self
            .routing
            .specialists
            .iter()
            .any(|s| s.id == self.routing.fallback_specialist)
        {
            issues.push(ConfigIssue::error(format!(
                "routing.fallback_specialist '{}' is not a declared specialist",
                self.routing.fallback_specialist
            )));
        }

        let weight_sum: f64 = self.quality.weights.as_array().iter().sum();
        if (weight_sum - 1.0).abs() > 1e-9 {
            issues.push(ConfigIssue::warning(format!(
                "quality.weights sum to {weight_sum}, expected 1.0"
            )));
        }

        if self.completion.complete_threshold <= self.completion.followup_threshold {
            issues.push(ConfigIssue::error(
                "completion.complete_threshold must exceed followup_threshold",
            ));
        }

        if self.engine.max_steps_per_turn == 0 {
            issues.push(ConfigIssue::error("engine.max_steps_per_turn must be > 0"));
        }

        issues
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Validation issues
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
