//! The public turn API: `run_turn` / `resume_turn` / `cancel`.
//!
//! One call to [`Orchestrator::run_turn`] consumes one user message and
//! yields one [`TurnResult`]. State is loaded from the store (or
//! seeded), the graph runs strictly sequentially, and the result is
//! persisted — except on cancellation, which leaves the conversation in
//! its pre-turn persisted state.

use std::sync::Arc;

use chrono::Utc;

use cc_domain::config::Config;
use cc_domain::{ConversationState, Error, Message, Result, StatePatch, WorkflowState};
use cc_intelligence::PerformanceTracker;
use cc_memory::{InMemoryStore, MemoryStore};
use cc_providers::LlmClient;
use cc_state::StateStore;
use cc_tools::{
    delegation_tools, AnalyticsSink, ResourceSearch, StaticResourceSearch, ToolRegistry,
    TracingSink,
};

use crate::cancel::CancelMap;
use crate::events::{EventSink, TurnEvent};
use crate::graph::{specialist_edge, supervisor_edge, GraphExecutor, TurnOutcome, SUPERVISOR};
use crate::review::{PendingReview, ReviewDecision, ReviewRequest, ReviewStore};
use crate::specialist::{profiles_from_config, SpecialistNode};
use crate::supervisor::SupervisorNode;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turn result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What one turn produced, from the caller's point of view.
#[derive(Debug)]
pub enum TurnResult {
    /// The conversation is complete.
    Completed(ConversationState),
    /// The turn finished; the conversation continues on the next user
    /// message.
    AwaitingUser(ConversationState),
    /// A human must act: either a pending review (resumable via
    /// `resume_turn`) or a terminal escalation.
    AwaitingHuman(ConversationState, ReviewRequest),
}

impl TurnResult {
    pub fn state(&self) -> &ConversationState {
        match self {
            TurnResult::Completed(s) => s,
            TurnResult::AwaitingUser(s) => s,
            TurnResult::AwaitingHuman(s, _) => s,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Builder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OrchestratorBuilder {
    config: Arc<Config>,
    store: Arc<dyn StateStore>,
    llm: Arc<dyn LlmClient>,
    resources: Arc<dyn ResourceSearch>,
    memory: Arc<dyn MemoryStore>,
    analytics: Arc<dyn AnalyticsSink>,
    extra_tools: Vec<Arc<dyn cc_tools::Tool>>,
}

impl OrchestratorBuilder {
    pub fn with_resources(mut self, resources: Arc<dyn ResourceSearch>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Register an additional tool beyond the built-in delegation set.
    pub fn with_tool(mut self, tool: Arc<dyn cc_tools::Tool>) -> Self {
        self.extra_tools.push(tool);
        self
    }

    pub fn build(self) -> Orchestrator {
        let config = self.config;

        let mut registry = ToolRegistry::new(std::time::Duration::from_millis(
            config.engine.tool_timeout_ms,
        ));
        for tool in delegation_tools(&config.routing) {
            registry.register(tool);
        }
        for tool in self.extra_tools {
            registry.register(tool);
        }
        let registry = Arc::new(registry);

        let tracker = Arc::new(PerformanceTracker::new(config.clone()));

        let supervisor = SupervisorNode::new(
            config.clone(),
            self.llm.clone(),
            registry,
            self.resources,
            self.memory,
            self.analytics,
            tracker,
        );

        let mut executor = GraphExecutor::new(SUPERVISOR, config.engine.max_steps_per_turn);
        executor.add_node(Arc::new(supervisor));

        let specialist_ids: Vec<String> = config
            .routing
            .specialists
            .iter()
            .map(|s| s.id.clone())
            .collect();
        executor.add_conditional_edge(SUPERVISOR, supervisor_edge(specialist_ids));

        for profile in profiles_from_config(&config) {
            let id = profile.id.clone();
            executor.add_node(Arc::new(SpecialistNode::new(
                profile,
                config.clone(),
                self.llm.clone(),
            )));
            executor.add_conditional_edge(&id, specialist_edge(config.engine.max_handoffs));
        }

        Orchestrator {
            config,
            store: self.store,
            executor,
            reviews: ReviewStore::new(),
            cancel_map: CancelMap::new(),
            events: parking_lot::Mutex::new(EventSink::disabled()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Orchestrator {
    config: Arc<Config>,
    store: Arc<dyn StateStore>,
    executor: GraphExecutor,
    reviews: ReviewStore,
    cancel_map: CancelMap,
    events: parking_lot::Mutex<EventSink>,
}

impl Orchestrator {
    /// Start building an orchestrator with default collaborators
    /// (static resource catalog, in-process memory, log-line analytics).
    pub fn builder(
        config: Arc<Config>,
        store: Arc<dyn StateStore>,
        llm: Arc<dyn LlmClient>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            config,
            store,
            llm,
            resources: Arc::new(StaticResourceSearch::new()),
            memory: Arc::new(InMemoryStore::new()),
            analytics: Arc::new(TracingSink),
            extra_tools: Vec::new(),
        }
    }

    /// Subscribe to per-node state snapshots for all subsequent turns.
    pub fn subscribe_events(&self, capacity: usize) -> tokio::sync::mpsc::Receiver<TurnEvent> {
        let (sink, rx) = EventSink::channel(capacity);
        *self.events.lock() = sink;
        rx
    }

    /// Run one turn for a user message.
    pub async fn run_turn(
        &self,
        user_id: &str,
        conversation_id: &str,
        user_message: &str,
    ) -> Result<TurnResult> {
        if self.reviews.is_pending(conversation_id) {
            return Err(Error::Other(format!(
                "conversation {conversation_id} is awaiting human review; call resume_turn"
            )));
        }
        if self.cancel_map.is_running(conversation_id) {
            return Err(Error::Other(format!(
                "a turn is already running for conversation {conversation_id}"
            )));
        }

        let mut state = match self.store.load(user_id, conversation_id).await {
            Ok(state) => state,
            Err(Error::NotFound(_)) => ConversationState::seed(user_id, conversation_id),
            // Io / Corrupt escalate to the caller with no state change.
            Err(e) => return Err(e),
        };

        // A completed conversation stays completed; the terminal node is
        // the only thing a further turn may traverse.
        if state.conversation_complete {
            return Ok(TurnResult::Completed(state));
        }

        state.apply(StatePatch::new().message(Message::user(user_message)));

        self.execute(state, None).await
    }

    /// Re-enter a turn that was interrupted for human review.
    pub async fn resume_turn(
        &self,
        conversation_id: &str,
        decision: ReviewDecision,
    ) -> Result<TurnResult> {
        let PendingReview {
            user_id,
            node,
            state: parked_state,
            request,
            created_at,
        } = self.reviews.take(conversation_id).ok_or_else(|| {
            Error::NotFound(format!("no pending review for conversation {conversation_id}"))
        })?;

        let mut state = parked_state.clone();
        state.workflow_state = WorkflowState::Active;
        // The reviewer has acted; the escalate path re-raises this if
        // the conversation still needs a human.
        state.needs_human_review = false;

        match self.execute(state, Some((node.clone(), decision))).await {
            Ok(result) => Ok(result),
            Err(e) => {
                // Leave the review resumable rather than losing it to a
                // transient failure.
                self.reviews.insert(
                    conversation_id,
                    PendingReview {
                        user_id,
                        node,
                        state: parked_state,
                        request,
                        created_at,
                    },
                );
                Err(e)
            }
        }
    }

    /// Request cooperative cancellation of a running turn.
    pub fn cancel(&self, conversation_id: &str) -> bool {
        self.cancel_map.cancel(conversation_id)
    }

    /// Conversations currently parked on a human review.
    pub fn pending_reviews(&self) -> Vec<String> {
        self.reviews.pending_ids()
    }

    async fn execute(
        &self,
        state: ConversationState,
        resume_at: Option<(String, ReviewDecision)>,
    ) -> Result<TurnResult> {
        let conversation_id = state.conversation_id.clone();
        let user_id = state.user_id.clone();
        let token = self.cancel_map.register(&conversation_id);
        let events = self.events.lock().clone();

        let outcome = self.executor.run(state, &token, &events, resume_at).await;
        self.cancel_map.remove(&conversation_id);

        match outcome {
            Ok(TurnOutcome::Finished(state)) => {
                let saved = self.store.save(state).await?;
                Ok(self.classify(saved))
            }
            Ok(TurnOutcome::Interrupted {
                mut state,
                node,
                request,
            }) => {
                state.workflow_state = WorkflowState::WaitingForInput;
                state.needs_human_review = true;
                let saved = self.store.save(state).await?;
                self.reviews.insert(
                    &conversation_id,
                    PendingReview {
                        user_id,
                        node,
                        state: saved.clone(),
                        request: request.clone(),
                        created_at: Utc::now(),
                    },
                );
                Ok(TurnResult::AwaitingHuman(saved, request))
            }
            // Cancelled (and every other executor error) persists nothing.
            Err(e) => Err(e),
        }
    }

    fn classify(&self, state: ConversationState) -> TurnResult {
        if state.conversation_complete {
            TurnResult::Completed(state)
        } else if state.workflow_state == WorkflowState::PendingHuman {
            let request = self.escalation_request(&state);
            TurnResult::AwaitingHuman(state, request)
        } else {
            TurnResult::AwaitingUser(state)
        }
    }

    /// Terminal escalation payload for turns that ended in
    /// `pending_human` (no resumable interrupt — a human takes over).
    fn escalation_request(&self, state: &ConversationState) -> ReviewRequest {
        let priority = state
            .last_assistant_message()
            .and_then(|m| m.metadata.flag_str("priority_level"))
            .unwrap_or("high")
            .to_owned();
        ReviewRequest {
            question: "Conversation escalated to a human specialist".to_owned(),
            priority,
            reasons: Vec::new(),
            user_query: state
                .last_user_message()
                .map(|m| m.content.clone())
                .unwrap_or_default(),
            quality_score: state.quality_metrics.as_ref().map(|q| q.overall).unwrap_or(0.0),
            routing_confidence: state
                .routing_decision
                .as_ref()
                .map(|r| r.confidence_level.as_str().to_owned())
                .unwrap_or_else(|| "uncertain".to_owned()),
            specialist_assigned: state
                .routing_decision
                .as_ref()
                .map(|r| r.specialist_assigned.clone())
                .unwrap_or_default(),
            review_options: Vec::new(),
            recommended_wait_secs: self.config.human_loop.urgent_wait_secs,
        }
    }
}
