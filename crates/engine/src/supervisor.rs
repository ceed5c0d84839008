//! The supervisor node — entry point of every turn.
//!
//! Pipeline: extract the user message, run identity recognition and
//! routing, generate the enhanced response through the LLM (with
//! best-effort memory and resource-search context), score its quality,
//! update the performance tracker, then decide: complete the turn,
//! stop at the handoff cap, escalate or interrupt for human review,
//! hand off to a specialist, or answer directly.

use std::sync::Arc;

use chrono::Utc;

use cc_domain::config::Config;
use cc_domain::{
    ConversationState, CoordinationMetadata, HandoffRecord, IdentityProfile, Message,
    QualityMetrics, Result, RoutingDecision, StatePatch, WorkflowState,
};
use cc_intelligence::{
    CompletionChecker, HumanLoopCoordinator, IdentityRecognizer, PerformanceTracker,
    QualityAnalyzer, RecommendedAction, ReviewPriority, RoutingEngine,
};
use cc_memory::{MemoryEntry, MemoryStore};
use cc_providers::{ChatRequest, ChatResponse, LlmClient};
use cc_tools::{AnalyticsSink, ResourceSearch, ToolOutcome, ToolRegistry};

use crate::graph::{AgentNode, GotoTarget, NodeContext, NodeResult, SUPERVISOR};
use crate::recovery::{self, FALLBACK_HANDOFF, LOG_AND_CONTINUE};
use crate::review::{ReviewDecision, ReviewRequest};

pub struct SupervisorNode {
    config: Arc<Config>,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    resources: Arc<dyn ResourceSearch>,
    memory: Arc<dyn MemoryStore>,
    analytics: Arc<dyn AnalyticsSink>,
    identity: IdentityRecognizer,
    routing: RoutingEngine,
    quality: QualityAnalyzer,
    completion: CompletionChecker,
    human_loop: HumanLoopCoordinator,
    tracker: Arc<PerformanceTracker>,
}

impl SupervisorNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        resources: Arc<dyn ResourceSearch>,
        memory: Arc<dyn MemoryStore>,
        analytics: Arc<dyn AnalyticsSink>,
        tracker: Arc<PerformanceTracker>,
    ) -> Self {
        Self {
            identity: IdentityRecognizer::new(config.clone()),
            routing: RoutingEngine::new(config.clone()),
            quality: QualityAnalyzer::new(config.clone()),
            completion: CompletionChecker::new(config.clone()),
            human_loop: HumanLoopCoordinator::new(config.clone()),
            config,
            llm,
            tools,
            resources,
            memory,
            analytics,
            tracker,
        }
    }

    /// Latest user message, or the configured seed prompt.
    fn user_message(&self, state: &ConversationState) -> String {
        state
            .last_user_message()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| self.config.engine.default_user_prompt.clone())
    }

    /// Best-effort context gathering + the LLM call. Returns the
    /// response and whether resource search contributed.
    async fn generate_response(
        &self,
        state: &ConversationState,
        user_message: &str,
        identity: &IdentityProfile,
        routing: &RoutingDecision,
        human_feedback: Option<&str>,
        first_entry: bool,
    ) -> (Result<ChatResponse>, bool) {
        // Memory retrieval never blocks the pipeline.
        let memory_context = match self.memory.retrieve(&state.user_id, user_message, 3).await {
            Ok(entries) if !entries.is_empty() => {
                let lines: Vec<String> =
                    entries.iter().map(|e| format!("- {}", e.content)).collect();
                Some(lines.join("\n"))
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "memory retrieval failed");
                None
            }
        };

        // Resource search: a failure degrades to a fixed fallback line.
        let (resources_text, resources_ok) = match self
            .resources
            .search(user_message, &identity.primary_identity)
            .await
        {
            Ok(text) => (text, true),
            Err(e) => {
                tracing::warn!(error = %e, "resource search failed");
                (
                    "Resource search temporarily unavailable - using fallback guidance".to_owned(),
                    false,
                )
            }
        };

        let system = self.build_prompt(
            state,
            identity,
            routing,
            &resources_text,
            memory_context.as_deref(),
            human_feedback,
        );

        let request = ChatRequest {
            system: Some(system),
            messages: state.messages.clone(),
            tools: self.tools.definitions(),
            temperature: None,
            max_tokens: None,
        };

        let response = self.llm.complete(request).await;

        // Store the query once per turn; a resumed node must not
        // duplicate its own effects.
        if first_entry {
            if let Err(e) = self
                .memory
                .store(
                    &state.user_id,
                    MemoryEntry::new(format!("User query: {user_message}"), "user_query", 0.8),
                )
                .await
            {
                tracing::warn!(error = %e, "memory store failed");
            }
        }

        (response, resources_ok)
    }

    fn build_prompt(
        &self,
        state: &ConversationState,
        identity: &IdentityProfile,
        routing: &RoutingDecision,
        resources_text: &str,
        memory_context: Option<&str>,
        human_feedback: Option<&str>,
    ) -> String {
        let specialists = &self.config.routing.specialists;
        let delegation_matrix: Vec<String> = specialists
            .iter()
            .map(|s| format!("- {} -> delegate_to_{}", s.display_name, s.id))
            .collect();

        let mut prompt = format!(
            "You are the supervisor of a climate-economy career guidance team \
             for {geography}.\n\n\
             USER IDENTITY ANALYSIS:\n\
             - Primary identity: {primary} (confidence {confidence:.2})\n\
             - Secondary identities: {secondaries}\n\
             - Intersectionality factors: {factors}\n\
             - Barriers: {barriers}\n\
             - Strengths: {strengths}\n\n\
             ROUTING DECISION:\n\
             - Assigned specialist: {specialist}\n\
             - Confidence: {routing_confidence}\n\
             - Reasoning: {reasoning}\n\n\
             CONVERSATION FLOW:\n\
             - Handoffs so far: {handoffs}/{max_handoffs}. If the budget is nearly \
             spent, answer comprehensively yourself instead of delegating.\n\n\
             VERIFIED RESOURCES:\n{resources}\n\n\
             Every recommendation must cite a specific organization and contact. \
             Use the delegate_to_* tools to hand off when the user needs \
             specialist support:\n{matrix}\n",
            geography = identity.geographic_context,
            primary = identity.primary_identity,
            confidence = identity.confidence_score,
            secondaries = join_or_none(&identity.secondary_identities),
            factors = join_or_none(&identity.intersectionality_factors),
            barriers = join_or_none(&identity.barriers_identified),
            strengths = join_or_none(&identity.strengths_identified),
            specialist = routing.specialist_assigned,
            routing_confidence = routing.confidence_level,
            reasoning = routing.reasoning.trim_end(),
            handoffs = state.handoff_count,
            max_handoffs = self.config.engine.max_handoffs,
            resources = resources_text,
            matrix = delegation_matrix.join("\n"),
        );

        if let Some(memory) = memory_context {
            prompt.push_str(&format!("\nRELEVANT HISTORY:\n{memory}\n"));
        }
        if let Some(feedback) = human_feedback {
            prompt.push_str(&format!(
                "\nHUMAN REVIEWER FEEDBACK (apply before answering):\n{feedback}\n"
            ));
        }
        prompt
    }

    /// Post-specialist wrap-up: the specialist already answered in this
    /// turn, so the supervisor assesses its response and ends the turn
    /// instead of generating (and routing) again. This is what bounds
    /// the supervisor↔specialist cycle structurally — handoff caps are
    /// the backstop, not the only brake.
    fn wrap_up(
        &self,
        state: &ConversationState,
        user_message: &str,
        specialist_response: &str,
    ) -> NodeResult {
        let identity = state
            .enhanced_identity
            .clone()
            .unwrap_or_else(|| self.identity.analyze(user_message));
        let routing = state
            .routing_decision
            .clone()
            .unwrap_or_else(|| self.routing.decide(&identity));

        let quality = self
            .quality
            .analyze(specialist_response, &identity, &state.tools_used);
        let snapshot = self.tracker.record(&state.session_id(), quality.overall);
        self.analytics.log(
            &state.session_id(),
            serde_json::json!({
                "quality_score": quality.overall,
                "intelligence_level": quality.intelligence_level.as_str(),
                "session_average": snapshot.session_average,
                "response_count": snapshot.response_count,
                "phase": "specialist_wrap_up",
            }),
        );

        let completion = self.completion.check(user_message, state, specialist_response);
        if completion.recommended_action == RecommendedAction::Complete {
            let content = format!(
                "Glad we could help! Summary: {signals}. Follow up on the \
                 contacts shared above, and come back any time.",
                signals = completion.signals.join("; "),
            );
            let message = Message::assistant(SUPERVISOR, content)
                .with_flag("conversation_complete", true)
                .with_flag("completion_confidence", completion.score);
            let mut patch = self.analysis_patch(&identity, &routing, &quality).complete();
            patch.messages.push(message);
            return NodeResult::End(patch);
        }

        // Turn over; the specialist's answer stands and we await the
        // user's next message.
        let mut patch = self.analysis_patch(&identity, &routing, &quality);
        patch.current_specialist = Some(Some(SUPERVISOR.to_owned()));
        NodeResult::End(patch)
    }

    /// Patch fields common to every return path of the pipeline.
    fn analysis_patch(
        &self,
        identity: &IdentityProfile,
        routing: &RoutingDecision,
        quality: &QualityMetrics,
    ) -> StatePatch {
        StatePatch {
            enhanced_identity: Some(identity.clone()),
            routing_decision: Some(routing.clone()),
            quality_metrics: Some(quality.clone()),
            confidence_score: Some((quality.overall / 10.0).max(identity.confidence_score)),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl AgentNode for SupervisorNode {
    fn name(&self) -> &str {
        SUPERVISOR
    }

    async fn run(&self, state: &ConversationState, ctx: &NodeContext) -> Result<NodeResult> {
        let user_message = self.user_message(state);
        tracing::debug!(
            conversation_id = %state.conversation_id,
            handoff_count = state.handoff_count,
            "supervisor turn"
        );

        // A specialist just handed control back within this turn: wrap
        // up rather than generate again.
        if let Some(last) = state.messages.last() {
            if last.role == cc_domain::Role::Assistant {
                if let Some(agent) = last.metadata.agent.as_deref() {
                    if agent != SUPERVISOR && self.config.routing.is_specialist(agent) {
                        return Ok(self.wrap_up(state, &user_message, &last.content));
                    }
                }
            }
        }

        // 1–3: identity recognition and routing.
        let identity = self.identity.analyze(&user_message);
        let routing = self.routing.decide(&identity);

        // 4: enhanced response via the LLM, with reviewer feedback
        // folded in when this is a post-interrupt re-entry.
        let human_feedback = ctx.resume_decision.as_ref().and_then(|d| d.feedback());
        let (response, resources_ok) = self
            .generate_response(
                state,
                &user_message,
                &identity,
                &routing,
                human_feedback,
                ctx.resume_decision.is_none(),
            )
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                // LLM failure: fixed fallback message plus a handoff to
                // the fallback specialist. This is the only supervisor
                // path that increments handoff_count outside step 10.
                let fallback = self.config.routing.fallback_specialist.clone();
                let record = recovery::error_record(
                    &e,
                    [
                        ("handler", "supervisor".to_owned()),
                        ("user_message", truncate(&user_message, 200)),
                    ],
                    FALLBACK_HANDOFF,
                );
                let message = Message::assistant(
                    SUPERVISOR,
                    recovery::fallback_assistant_text(&self.config.human_loop.escalation_contact),
                )
                .with_flag("fallback", true)
                .with_flag("handoff_to", fallback.clone());

                let mut patch = StatePatch {
                    current_specialist: Some(Some(fallback.clone())),
                    handoff_count: Some(state.handoff_count + 1),
                    enhanced_identity: Some(identity),
                    routing_decision: Some(routing),
                    ..Default::default()
                };
                patch.messages.push(message);
                patch.specialist_handoffs.push(HandoffRecord {
                    from_node: SUPERVISOR.to_owned(),
                    to_node: fallback.clone(),
                    timestamp: Utc::now(),
                    task_description: "fallback after provider failure".to_owned(),
                    tool_call_id: None,
                });
                patch.error_recovery_log.push(record);

                return Ok(NodeResult::Goto {
                    target: GotoTarget::Node(fallback),
                    patch,
                });
            }
        };

        // 5: quality scoring of the response text.
        let quality = self
            .quality
            .analyze(&response.content, &identity, &state.tools_used);

        // 7/8 conditions, computed up front: when either ends the turn
        // it takes precedence over a human-loop interrupt.
        let completion = self
            .completion
            .check(&user_message, state, &response.content);
        let completing = completion.recommended_action == RecommendedAction::Complete;
        let cap_reached = state.handoff_count >= self.config.engine.max_handoffs;

        // 9 (interrupt half): decide whether to suspend BEFORE anything
        // is recorded, so a discarded response never scores and the
        // resumed re-entry records exactly once. Urgent cases are held
        // for the escalation handling below.
        let mut pending_urgent = None;
        if ctx.resume_decision.is_none() && !completing && !cap_reached {
            let assessment = self.human_loop.evaluate(state, &quality, &routing);
            if assessment.needs_human_intervention {
                match assessment.priority {
                    ReviewPriority::High | ReviewPriority::Medium => {
                        return Ok(NodeResult::Interrupt(ReviewRequest::new(
                            assessment.priority,
                            assessment.reasons,
                            &user_message,
                            quality.overall,
                            routing.confidence_level.as_str(),
                            &routing.specialist_assigned,
                            assessment.recommended_wait_secs,
                        )));
                    }
                    ReviewPriority::Urgent => pending_urgent = Some(assessment),
                    ReviewPriority::Low => {}
                }
            }
        }

        // 6: performance tracking and next-action selection. Deferred
        // past the interrupt point; every non-interrupted pass lands
        // here exactly once.
        let snapshot = self.tracker.record(&state.session_id(), quality.overall);
        let next_action = PerformanceTracker::next_action(routing.confidence_level, quality.overall);
        self.analytics.log(
            &state.session_id(),
            serde_json::json!({
                "quality_score": quality.overall,
                "intelligence_level": quality.intelligence_level.as_str(),
                "session_average": snapshot.session_average,
                "response_count": snapshot.response_count,
                "next_action": next_action.as_str(),
            }),
        );

        // 7: completion detection.
        if completing {
            let content = format!(
                "Thank you for using the climate career assistant!\n\n\
                 Summary of our conversation: {signals}\n\
                 Resources provided: {resources}\n\
                 Specialists consulted: {handoffs}\n\n\
                 Follow up on the contacts shared above, and come back any \
                 time you need more guidance.",
                signals = completion.signals.join("; "),
                resources = state.resource_recommendations.len(),
                handoffs = state.specialist_handoffs.len(),
            );
            let message = Message::assistant(SUPERVISOR, content)
                .with_flag("conversation_complete", true)
                .with_flag("completion_confidence", completion.score)
                .with_flag("quality_score", quality.overall);

            let mut patch = self.analysis_patch(&identity, &routing, &quality).complete();
            patch.messages.push(message);
            return Ok(NodeResult::End(patch));
        }

        // 8: loop prevention.
        if cap_reached {
            let content = format!(
                "I've consulted our specialists ({count} handoffs) and gathered \
                 comprehensive guidance for your needs. Follow up on the \
                 specific contacts and resources shared above; for further \
                 assistance please start a new conversation.",
                count = state.handoff_count,
            );
            let message = Message::assistant(SUPERVISOR, content)
                .with_flag("max_handoffs_reached", true)
                .with_flag("handoff_count", state.handoff_count)
                .with_flag("conversation_complete", true);

            let mut patch = self.analysis_patch(&identity, &routing, &quality).complete();
            patch.messages.push(message);
            return Ok(NodeResult::End(patch));
        }

        // 9 (escalation half): a reviewer-chosen escalation, then any
        // urgent case detected before recording. Approve / feedback
        // decisions fall through to step 10 with the regenerated
        // response.
        if let Some(ReviewDecision::EscalateToHumanSpecialist) = ctx.resume_decision.as_ref() {
            let message = Message::assistant(
                SUPERVISOR,
                "This conversation has been escalated to a human specialist \
                 who will contact you shortly for personalized assistance.",
            )
            .with_flag("human_escalated", true);

            let mut patch = self.analysis_patch(&identity, &routing, &quality);
            patch.workflow_state = Some(WorkflowState::PendingHuman);
            patch.needs_human_review = Some(true);
            patch.messages.push(message);
            return Ok(NodeResult::End(patch));
        }

        if let Some(assessment) = pending_urgent {
            let contact = assessment
                .escalation_contact
                .as_deref()
                .unwrap_or(&self.config.human_loop.escalation_contact);
            let content = format!(
                "URGENT: human intervention required.\n\
                 Issue detected: {reasons}\n\
                 Please contact: {contact}\n\
                 Reference: {reference}\n\
                 A human specialist will reach out shortly.",
                reasons = assessment.reasons.join(", "),
                contact = contact,
                reference = state.conversation_id,
            );
            let message = Message::assistant(SUPERVISOR, content)
                .with_flag("urgent_intervention", true)
                .with_flag("priority_level", assessment.priority.as_str());

            let mut patch = self.analysis_patch(&identity, &routing, &quality);
            patch.workflow_state = Some(WorkflowState::PendingHuman);
            patch.needs_human_review = Some(true);
            patch.messages.push(message);
            return Ok(NodeResult::End(patch));
        }

        // 10: tool dispatch and delegation handoffs.
        if !response.tool_calls.is_empty() {
            let mut messages = Vec::new();
            let mut tool_messages = Vec::new();
            let mut errors = Vec::new();
            let mut tools_used: Vec<String> = Vec::new();
            let mut delegation: Option<(cc_tools::ToolCommand, String)> = None;

            for call in &response.tool_calls {
                match self.tools.invoke(&call.name, &call.arguments).await {
                    Ok(ToolOutcome::Content(content)) => {
                        tool_messages.push(Message::tool_result(&call.id, content, SUPERVISOR));
                        tools_used.push(call.name.clone());
                    }
                    Ok(ToolOutcome::Command(cmd)) => {
                        tool_messages.push(Message::tool_result(
                            &call.id,
                            format!(
                                "Transferred to {} specialist: {}",
                                cmd.goto, cmd.task_description
                            ),
                            SUPERVISOR,
                        ));
                        tools_used.push(call.name.clone());
                        if delegation.is_none() {
                            delegation = Some((cmd, call.id.clone()));
                        }
                    }
                    Err(e) => {
                        tool_messages.push(recovery::tool_failure_message(call, &e, SUPERVISOR));
                        errors.push(recovery::error_record(
                            &e,
                            [("tool_name", call.name.clone())],
                            LOG_AND_CONTINUE,
                        ));
                    }
                }
            }

            let mut assistant = Message::assistant_with_tool_calls(
                SUPERVISOR,
                response.content.clone(),
                response.tool_calls.clone(),
            );
            if let Some((cmd, _)) = &delegation {
                assistant = assistant.with_flag("handoff_to", cmd.goto.clone());
            }
            messages.push(assistant);
            messages.extend(tool_messages);

            let mut patch = self.analysis_patch(&identity, &routing, &quality);
            patch.messages = messages;
            patch.error_recovery_log = errors;
            if resources_ok {
                tools_used.push("resource_search".to_owned());
            }
            patch.tools_used = tools_used;

            if let Some((cmd, tool_call_id)) = delegation {
                let target = cmd.goto.clone();
                patch.handoff_count = Some(state.handoff_count + 1);
                patch.current_specialist = Some(Some(target.clone()));
                patch.specialist_handoffs.push(HandoffRecord {
                    from_node: SUPERVISOR.to_owned(),
                    to_node: target.clone(),
                    timestamp: Utc::now(),
                    task_description: cmd.task_description.clone(),
                    tool_call_id: Some(tool_call_id),
                });
                patch.coordination = Some(CoordinationMetadata {
                    task_description: cmd.task_description,
                    from_node: SUPERVISOR.to_owned(),
                    handoff_time: Utc::now(),
                    routing_confidence: routing.confidence_level,
                    success_metrics: routing.success_metrics.clone(),
                });

                tracing::info!(
                    specialist = %target,
                    handoff_count = state.handoff_count + 1,
                    "delegating to specialist"
                );
                return Ok(NodeResult::Goto {
                    target: GotoTarget::Node(target),
                    patch,
                });
            }

            return Ok(NodeResult::StateUpdate(patch));
        }

        // 11: direct response; the conditional edge decides what's next.
        let mut patch = self.analysis_patch(&identity, &routing, &quality);
        patch.current_specialist = Some(Some(SUPERVISOR.to_owned()));
        patch
            .messages
            .push(Message::assistant(SUPERVISOR, response.content));
        if resources_ok {
            patch.tools_used.push("resource_search".to_owned());
        }
        Ok(NodeResult::StateUpdate(patch))
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_owned()
    } else {
        items.join(", ")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_owned()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
