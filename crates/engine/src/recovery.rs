//! Error recovery — turns node and tool failures into error records
//! and recovery transitions instead of failed turns.
//!
//! Everything except a state-store failure or a cancellation is
//! recovered inside the turn: tool errors become failure tool messages
//! (keeping the tool-message pairing invariant), and a supervisor LLM
//! failure becomes a fallback assistant message plus a handoff to the
//! designated fallback specialist.

use std::collections::BTreeMap;

use chrono::Utc;

use cc_domain::{Error, ErrorRecord, Message, ToolCall};

/// Recovery strategies stamped on error records.
pub const LOG_AND_CONTINUE: &str = "log_and_continue";
pub const FALLBACK_HANDOFF: &str = "fallback_handoff";

/// Build an error record from a recovered error.
pub fn error_record(
    error: &Error,
    context: impl IntoIterator<Item = (&'static str, String)>,
    strategy: &str,
) -> ErrorRecord {
    let context: BTreeMap<String, String> = context
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();

    tracing::warn!(
        error_type = error.kind(),
        error = %error,
        strategy,
        "recovered error"
    );

    ErrorRecord {
        error_type: error.kind().to_owned(),
        message: error.to_string(),
        timestamp: Utc::now(),
        context,
        recovery_strategy: strategy.to_owned(),
    }
}

/// Tool message recording a failed invocation. Keeps the message-flow
/// invariant: the call id is answered even though the tool failed.
pub fn tool_failure_message(call: &ToolCall, error: &Error, agent: &str) -> Message {
    Message::tool_result(
        &call.id,
        format!("Error executing tool '{}': {error}", call.name),
        agent,
    )
    .with_flag("is_error", true)
}

/// Fixed assistant fallback when the supervisor's LLM call fails.
pub fn fallback_assistant_text(escalation_contact: &str) -> String {
    format!(
        "I apologize for the technical issue. A specialist will pick this up \
         directly; for immediate assistance please contact {escalation_contact}."
    )
}
