//! Graph executor — runs the node graph for one turn.
//!
//! Nodes are async handlers returning a typed [`NodeResult`]. After a
//! `StateUpdate` the node's conditional edge picks the next node; a
//! `Goto` overrides the edge (Command semantics); `End` terminates the
//! turn; `Interrupt` suspends it and hands the review request to the
//! caller, who later re-enters the same node with the decision.
//!
//! Strictly sequential within a turn: one node at a time, cancellation
//! checked only at node boundaries.

use std::collections::HashMap;
use std::sync::Arc;

use cc_domain::{ConversationState, Error, Result, StatePatch};

use crate::cancel::CancelToken;
use crate::events::EventSink;
use crate::review::{ReviewDecision, ReviewRequest};

/// Node id of the distinguished entry point.
pub const SUPERVISOR: &str = "supervisor";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node results and context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where a `Goto` jumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GotoTarget {
    Node(String),
    End,
}

/// What a node handler produced.
pub enum NodeResult {
    /// Apply the patch, then follow the node's conditional edge.
    StateUpdate(StatePatch),
    /// Apply the patch, then jump to `target` regardless of edges.
    Goto { target: GotoTarget, patch: StatePatch },
    /// Apply the patch and terminate the turn.
    End(StatePatch),
    /// Suspend the turn; no patch is applied. The node must be
    /// re-enterable: side-effect-free up to this point.
    Interrupt(ReviewRequest),
}

/// Per-invocation context handed to a node.
#[derive(Default)]
pub struct NodeContext {
    /// Present only when re-entering the node after an interrupt.
    pub resume_decision: Option<ReviewDecision>,
}

/// An executable graph node.
#[async_trait::async_trait]
pub trait AgentNode: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, state: &ConversationState, ctx: &NodeContext) -> Result<NodeResult>;
}

/// Where a conditional edge routes after a `StateUpdate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeTarget {
    Node(String),
    End,
    /// Route back to the same node — the turn is done and awaits new
    /// user input.
    Stay,
}

type EdgeFn = Box<dyn Fn(&ConversationState) -> EdgeTarget + Send + Sync>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How a turn ended (short of an error).
#[derive(Debug)]
pub enum TurnOutcome {
    /// The turn ran to completion; inspect `state.conversation_complete`
    /// and `state.workflow_state` to classify it.
    Finished(ConversationState),
    /// The turn suspended for human review at `node`.
    Interrupted {
        state: ConversationState,
        node: String,
        request: ReviewRequest,
    },
}

pub struct GraphExecutor {
    nodes: HashMap<String, Arc<dyn AgentNode>>,
    edges: HashMap<String, EdgeFn>,
    /// START transitions here unconditionally.
    entry: String,
    max_steps: u32,
}

impl GraphExecutor {
    pub fn new(entry: &str, max_steps: u32) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: entry.to_owned(),
            max_steps,
        }
    }

    pub fn add_node(&mut self, node: Arc<dyn AgentNode>) {
        self.nodes.insert(node.name().to_owned(), node);
    }

    pub fn add_conditional_edge<F>(&mut self, from: &str, edge: F)
    where
        F: Fn(&ConversationState) -> EdgeTarget + Send + Sync + 'static,
    {
        self.edges.insert(from.to_owned(), Box::new(edge));
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Run one turn from the entry node (or from `resume_at` when
    /// re-entering after an interrupt).
    pub async fn run(
        &self,
        mut state: ConversationState,
        cancel: &CancelToken,
        events: &EventSink,
        resume_at: Option<(String, ReviewDecision)>,
    ) -> Result<TurnOutcome> {
        let (mut current, mut resume_decision) = match resume_at {
            Some((node, decision)) => (node, Some(decision)),
            None => (self.entry.clone(), None),
        };

        let mut seq: u32 = 0;
        for _step in 0..self.max_steps {
            // Cooperative cancellation at the node boundary only.
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| Error::Other(format!("unknown graph node '{current}'")))?;

            let ctx = NodeContext {
                resume_decision: resume_decision.take(),
            };

            tracing::debug!(node = %current, seq, "running node");
            let result = node.run(&state, &ctx).await?;

            match result {
                NodeResult::Interrupt(request) => {
                    tracing::info!(node = %current, "turn interrupted for review");
                    return Ok(TurnOutcome::Interrupted {
                        state,
                        node: current,
                        request,
                    });
                }
                NodeResult::End(patch) => {
                    state.apply(patch);
                    seq += 1;
                    events.emit(&current, seq, &state);
                    return Ok(TurnOutcome::Finished(state));
                }
                NodeResult::Goto { target, patch } => {
                    state.apply(patch);
                    seq += 1;
                    events.emit(&current, seq, &state);
                    match target {
                        GotoTarget::End => return Ok(TurnOutcome::Finished(state)),
                        GotoTarget::Node(next) => {
                            if !self.nodes.contains_key(&next) {
                                return Err(Error::Other(format!(
                                    "goto targets unknown node '{next}'"
                                )));
                            }
                            current = next;
                        }
                    }
                }
                NodeResult::StateUpdate(patch) => {
                    state.apply(patch);
                    seq += 1;
                    events.emit(&current, seq, &state);
                    let edge = self.edges.get(&current).ok_or_else(|| {
                        Error::Other(format!("node '{current}' has no conditional edge"))
                    })?;
                    match edge(&state) {
                        EdgeTarget::End => return Ok(TurnOutcome::Finished(state)),
                        EdgeTarget::Stay => return Ok(TurnOutcome::Finished(state)),
                        EdgeTarget::Node(next) if next == current => {
                            return Ok(TurnOutcome::Finished(state))
                        }
                        EdgeTarget::Node(next) => {
                            if !self.nodes.contains_key(&next) {
                                return Err(Error::Other(format!(
                                    "edge targets unknown node '{next}'"
                                )));
                            }
                            current = next;
                        }
                    }
                }
            }
        }

        // A turn that exhausts the step budget is a routing bug; fail
        // loudly rather than persist a half-done traversal silently.
        Err(Error::Other(format!(
            "turn exceeded {} node transitions without terminating",
            self.max_steps
        )))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conditional edges
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Supervisor edge, in priority order: completion, message flags,
/// routing decision, else stay.
pub fn supervisor_edge(known_specialists: Vec<String>) -> impl Fn(&ConversationState) -> EdgeTarget {
    move |state: &ConversationState| {
        if state.conversation_complete {
            return EdgeTarget::End;
        }

        if let Some(msg) = state.last_assistant_message() {
            if msg.metadata.flag("conversation_complete") {
                return EdgeTarget::End;
            }
            if let Some(target) = msg.metadata.flag_str("handoff_to") {
                if known_specialists.iter().any(|s| s == target) {
                    return EdgeTarget::Node(target.to_owned());
                }
            }
        }

        if let Some(routing) = &state.routing_decision {
            if known_specialists
                .iter()
                .any(|s| *s == routing.specialist_assigned)
            {
                return EdgeTarget::Node(routing.specialist_assigned.clone());
            }
        }

        EdgeTarget::Stay
    }
}

/// Specialist edge: completion or spent handoff budget ends the turn,
/// otherwise control returns to the supervisor.
pub fn specialist_edge(max_handoffs: u32) -> impl Fn(&ConversationState) -> EdgeTarget {
    move |state: &ConversationState| {
        if state.conversation_complete {
            return EdgeTarget::End;
        }
        if state.handoff_count >= max_handoffs {
            return EdgeTarget::End;
        }
        EdgeTarget::Node(SUPERVISOR.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{Message, RoutingDecision};

    struct StaticNode {
        name: String,
        results: parking_lot::Mutex<Vec<NodeResult>>,
    }

    impl StaticNode {
        fn new(name: &str, results: Vec<NodeResult>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                results: parking_lot::Mutex::new(results),
            })
        }
    }

    #[async_trait::async_trait]
    impl AgentNode for StaticNode {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _state: &ConversationState, _ctx: &NodeContext) -> Result<NodeResult> {
            let mut results = self.results.lock();
            if results.is_empty() {
                Ok(NodeResult::End(StatePatch::new()))
            } else {
                Ok(results.remove(0))
            }
        }
    }

    fn seed() -> ConversationState {
        ConversationState::seed("u", "c")
    }

    #[tokio::test]
    async fn end_terminates_immediately() {
        let mut exec = GraphExecutor::new("a", 10);
        exec.add_node(StaticNode::new(
            "a",
            vec![NodeResult::End(
                StatePatch::new().message(Message::assistant("a", "done")),
            )],
        ));

        let outcome = exec
            .run(seed(), &CancelToken::new(), &EventSink::disabled(), None)
            .await
            .unwrap();
        match outcome {
            TurnOutcome::Finished(state) => assert_eq!(state.messages.len(), 1),
            _ => panic!("expected Finished"),
        }
    }

    #[tokio::test]
    async fn goto_overrides_conditional_edge() {
        let mut exec = GraphExecutor::new("a", 10);
        exec.add_node(StaticNode::new(
            "a",
            vec![NodeResult::Goto {
                target: GotoTarget::Node("b".into()),
                patch: StatePatch::new(),
            }],
        ));
        exec.add_node(StaticNode::new("b", vec![]));
        // Edge would end the turn at `a`; the Goto must win.
        exec.add_conditional_edge("a", |_| EdgeTarget::End);

        let outcome = exec
            .run(seed(), &CancelToken::new(), &EventSink::disabled(), None)
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Finished(_)));
    }

    #[tokio::test]
    async fn self_route_finishes_the_turn() {
        let mut exec = GraphExecutor::new("a", 10);
        exec.add_node(StaticNode::new(
            "a",
            vec![NodeResult::StateUpdate(StatePatch::new())],
        ));
        exec.add_conditional_edge("a", |_| EdgeTarget::Node("a".into()));

        let outcome = exec
            .run(seed(), &CancelToken::new(), &EventSink::disabled(), None)
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Finished(_)));
    }

    #[tokio::test]
    async fn cancellation_stops_at_node_boundary() {
        let mut exec = GraphExecutor::new("a", 10);
        exec.add_node(StaticNode::new("a", vec![]));

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = exec
            .run(seed(), &cancel, &EventSink::disabled(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn runaway_graph_hits_step_cap() {
        let mut exec = GraphExecutor::new("a", 3);
        // Each invocation loops a → b → a …
        exec.add_node(StaticNode::new(
            "a",
            (0..10)
                .map(|_| NodeResult::Goto {
                    target: GotoTarget::Node("b".into()),
                    patch: StatePatch::new(),
                })
                .collect(),
        ));
        exec.add_node(StaticNode::new(
            "b",
            (0..10)
                .map(|_| NodeResult::Goto {
                    target: GotoTarget::Node("a".into()),
                    patch: StatePatch::new(),
                })
                .collect(),
        ));

        let err = exec
            .run(seed(), &CancelToken::new(), &EventSink::disabled(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("node transitions"));
    }

    #[tokio::test]
    async fn snapshots_carry_monotonic_sequence_numbers() {
        let mut exec = GraphExecutor::new("a", 10);
        exec.add_node(StaticNode::new(
            "a",
            vec![NodeResult::Goto {
                target: GotoTarget::Node("b".into()),
                patch: StatePatch::new(),
            }],
        ));
        exec.add_node(StaticNode::new("b", vec![]));

        let (sink, mut rx) = EventSink::channel(8);
        exec.run(seed(), &CancelToken::new(), &sink, None)
            .await
            .unwrap();

        let crate::events::TurnEvent::Snapshot { node, seq, .. } = rx.try_recv().unwrap();
        assert_eq!((node.as_str(), seq), ("a", 1));
        let crate::events::TurnEvent::Snapshot { node, seq, .. } = rx.try_recv().unwrap();
        assert_eq!((node.as_str(), seq), ("b", 2));
    }

    #[test]
    fn supervisor_edge_priorities() {
        let specialists = vec!["career".to_owned(), "veterans".to_owned()];
        let edge = supervisor_edge(specialists);

        // Priority 1: completion.
        let mut state = seed();
        state.conversation_complete = true;
        assert_eq!(edge(&state), EdgeTarget::End);

        // Priority 2: message flag.
        let mut state = seed();
        state.messages.push(
            Message::assistant("supervisor", "over to veterans").with_flag("handoff_to", "veterans"),
        );
        assert_eq!(edge(&state), EdgeTarget::Node("veterans".into()));

        // Priority 3: routing decision.
        let mut state = seed();
        state.routing_decision = Some(RoutingDecision::uncertain("career"));
        assert_eq!(edge(&state), EdgeTarget::Node("career".into()));

        // Priority 4: stay.
        let state = seed();
        assert_eq!(edge(&state), EdgeTarget::Stay);
    }

    #[test]
    fn specialist_edge_honors_handoff_cap() {
        let edge = specialist_edge(3);
        let mut state = seed();
        assert_eq!(edge(&state), EdgeTarget::Node(SUPERVISOR.into()));

        state.handoff_count = 3;
        assert_eq!(edge(&state), EdgeTarget::End);

        let mut done = seed();
        done.conversation_complete = true;
        assert_eq!(edge(&done), EdgeTarget::End);
    }
}
