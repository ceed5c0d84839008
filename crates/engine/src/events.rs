//! Turn event stream — state snapshots emitted after every node
//! transition, for callers that stream progress to clients.

use serde::Serialize;
use tokio::sync::mpsc;

use cc_domain::ConversationState;

/// Events emitted during a single turn.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum TurnEvent {
    /// State after a node transition. `seq` increases monotonically
    /// within the turn.
    #[serde(rename = "snapshot")]
    Snapshot {
        node: String,
        seq: u32,
        state: Box<ConversationState>,
    },
}

/// Optional sink for turn events. Sending never blocks the executor:
/// a full or closed channel drops the event.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<TurnEvent>>,
}

impl EventSink {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, rx)
    }

    pub fn emit(&self, node: &str, seq: u32, state: &ConversationState) {
        if let Some(tx) = &self.tx {
            let event = TurnEvent::Snapshot {
                node: node.to_owned(),
                seq,
                state: Box::new(state.clone()),
            };
            if let Err(e) = tx.try_send(event) {
                tracing::debug!(node, seq, error = %e, "dropping turn event");
            }
        }
    }
}
