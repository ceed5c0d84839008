//! Per-session performance tracking and next-action selection.
//!
//! Each session (`user_id:conversation_id`) keeps an ordered list of
//! overall quality scores and a running average. Entries are private to
//! their session; there is no cross-session sharing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use cc_domain::config::Config;
use cc_domain::RoutingConfidence;

/// Rolling view of one session after recording a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSnapshot {
    pub session_average: f64,
    pub response_count: usize,
}

/// What the supervisor should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    Delegate,
    Clarify,
    Guide,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::Delegate => "delegate",
            NextAction::Clarify => "clarify",
            NextAction::Guide => "guide",
        }
    }
}

pub struct PerformanceTracker {
    low_quality_floor: f64,
    sessions: Mutex<HashMap<String, Vec<f64>>>,
}

impl PerformanceTracker {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            low_quality_floor: config.human_loop.quality_threshold,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Append the turn's overall quality score and return the updated
    /// rolling view.
    pub fn record(&self, session_id: &str, overall: f64) -> SessionSnapshot {
        let mut sessions = self.sessions.lock();
        let scores = sessions.entry(session_id.to_owned()).or_default();
        scores.push(overall);
        let session_average = scores.iter().sum::<f64>() / scores.len() as f64;

        if overall < self.low_quality_floor {
            tracing::warn!(session_id, overall, "low quality response recorded");
        }

        SessionSnapshot {
            session_average,
            response_count: scores.len(),
        }
    }

    /// Current view without recording (for reporting).
    pub fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let sessions = self.sessions.lock();
        let scores = sessions.get(session_id)?;
        if scores.is_empty() {
            return None;
        }
        Some(SessionSnapshot {
            session_average: scores.iter().sum::<f64>() / scores.len() as f64,
            response_count: scores.len(),
        })
    }

    /// Next-action selection from routing confidence and quality.
    pub fn next_action(confidence: RoutingConfidence, overall: f64) -> NextAction {
        match confidence {
            RoutingConfidence::High | RoutingConfidence::Medium if overall >= 6.0 => {
                NextAction::Delegate
            }
            RoutingConfidence::Uncertain => NextAction::Clarify,
            _ => NextAction::Guide,
        }
    }
}
