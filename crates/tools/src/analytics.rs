//! Fire-and-forget analytics. `log` never fails and never blocks the
//! turn pipeline.

use serde_json::Value;

pub trait AnalyticsSink: Send + Sync {
    fn log(&self, session_id: &str, payload: Value);
}

/// Default sink: structured log lines.
#[derive(Default)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn log(&self, session_id: &str, payload: Value) {
        tracing::info!(session_id, %payload, "analytics");
    }
}
