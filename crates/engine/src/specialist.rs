//! Specialist nodes — leaf agents that produce a domain response and
//! hand control back to the supervisor, or close the conversation out
//! when completion signals (or the handoff budget) say so.
//!
//! One generic node parameterized by a [`SpecialistProfile`];
//! specialists never increment `handoff_count` — that is the
//! supervisor's job alone.

use std::sync::Arc;

use chrono::Utc;

use cc_domain::config::Config;
use cc_domain::{ConversationState, HandoffRecord, Message, Result, StatePatch};
use cc_intelligence::CompletionChecker;
use cc_providers::{ChatRequest, LlmClient};

use crate::graph::{AgentNode, GotoTarget, NodeContext, NodeResult, SUPERVISOR};
use crate::recovery::{self, LOG_AND_CONTINUE};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Profiles
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Domain persona for one specialist node.
#[derive(Debug, Clone)]
pub struct SpecialistProfile {
    pub id: String,
    pub display_name: String,
    /// One-paragraph persona used as the system prompt opening.
    pub persona: String,
    /// Seed question when a turn reaches the specialist with no user
    /// message on record.
    pub default_seed: String,
}

/// Build the specialist profiles for every configured capability row.
pub fn profiles_from_config(config: &Config) -> Vec<SpecialistProfile> {
    config
        .routing
        .specialists
        .iter()
        .map(|cap| {
            let (persona, default_seed) = persona_for(&cap.id, &cap.display_name);
            SpecialistProfile {
                id: cap.id.clone(),
                display_name: cap.display_name.clone(),
                persona,
                default_seed,
            }
        })
        .collect()
}

fn persona_for(id: &str, display_name: &str) -> (String, String) {
    match id {
        "career" => (
            "You are the team's career resources analyst. You cover resume \
             review, skills-gap analysis, training programs, and job matching \
             across the clean-energy economy. Cite specific organizations and \
             contacts for every recommendation."
                .to_owned(),
            "I need help with climate career opportunities".to_owned(),
        ),
        "veterans" => (
            "You are the team's veterans transition specialist. You translate \
             military occupational skills to civilian clean-energy roles, and \
             you know the veteran-specific programs, benefits, and employers. \
             Cite specific organizations and contacts for every recommendation."
                .to_owned(),
            "I'm a veteran interested in climate careers".to_owned(),
        ),
        "international" => (
            "You are the team's international credentials specialist. You \
             handle foreign credential evaluation, visa pathways, and \
             integration support for internationally trained professionals. \
             Cite specific organizations and contacts for every recommendation."
                .to_owned(),
            "I need help with international credentials for climate careers".to_owned(),
        ),
        "justice" => (
            "You are the team's environmental justice specialist. You connect \
             frontline and overburdened communities with organizing resources, \
             community-benefit roles, and equity-centered career pathways. \
             Cite specific organizations and contacts for every recommendation."
                .to_owned(),
            "I'm interested in environmental justice and climate careers".to_owned(),
        ),
        _ => (
            format!(
                "You are the team's {display_name}. Provide specific, \
                 actionable guidance in your domain and cite organizations \
                 and contacts for every recommendation."
            ),
            "I need help with climate career opportunities".to_owned(),
        ),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SpecialistNode {
    profile: SpecialistProfile,
    config: Arc<Config>,
    llm: Arc<dyn LlmClient>,
    completion: CompletionChecker,
}

impl SpecialistNode {
    pub fn new(profile: SpecialistProfile, config: Arc<Config>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            completion: CompletionChecker::new(config.clone()),
            profile,
            config,
            llm,
        }
    }

    fn build_prompt(&self, state: &ConversationState) -> String {
        let mut prompt = self.profile.persona.clone();

        if let Some(identity) = &state.enhanced_identity {
            prompt.push_str(&format!(
                "\n\nUser context: primary identity '{}'",
                identity.primary_identity
            ));
            if !identity.barriers_identified.is_empty() {
                prompt.push_str(&format!(
                    "; barriers to address: {}",
                    identity.barriers_identified.join(", ")
                ));
            }
            if !identity.strengths_identified.is_empty() {
                prompt.push_str(&format!(
                    "; strengths to build on: {}",
                    identity.strengths_identified.join(", ")
                ));
            }
            prompt.push('.');
        }

        if let Some(coordination) = &state.coordination {
            prompt.push_str(&format!(
                "\nDelegated task: {}",
                coordination.task_description
            ));
        }
        prompt
    }

    /// Canned response when the provider is down; the turn still gets a
    /// usable answer in this specialist's voice.
    fn fallback_response(&self) -> String {
        format!(
            "I'm the {name}, and while our full guidance service is briefly \
             unavailable, here is how to proceed: contact {contact} and \
             mention this conversation, and we will follow up with the \
             specific programs and contacts for your situation.",
            name = self.profile.display_name,
            contact = self.config.human_loop.escalation_contact,
        )
    }
}

#[async_trait::async_trait]
impl AgentNode for SpecialistNode {
    fn name(&self) -> &str {
        &self.profile.id
    }

    async fn run(&self, state: &ConversationState, _ctx: &NodeContext) -> Result<NodeResult> {
        let user_message = state
            .last_user_message()
            .map(|m| m.content.clone())
            .unwrap_or_else(|| self.profile.default_seed.clone());

        let request = ChatRequest {
            system: Some(self.build_prompt(state)),
            messages: state.messages.clone(),
            tools: Vec::new(),
            temperature: None,
            max_tokens: None,
        };

        let mut error_log = Vec::new();
        let response_text = match self.llm.complete(request).await {
            Ok(response) => response.content,
            Err(e) => {
                error_log.push(recovery::error_record(
                    &e,
                    [("handler", self.profile.id.clone())],
                    LOG_AND_CONTINUE,
                ));
                self.fallback_response()
            }
        };

        let status = self.completion.check(&user_message, state, &response_text);

        // Completion signals strong enough for the specialist to close
        // out directly (threshold intentionally below the supervisor's).
        if status.score >= self.completion.specialist_threshold() {
            let content = format!(
                "{response_text}\n\nNext steps: follow up with the contacts \
                 above, and reach back out if anything is unclear. Good luck \
                 with your climate career!"
            );
            let message = Message::assistant(&self.profile.id, content)
                .with_flag("conversation_complete", true)
                .with_flag("completion_confidence", status.score);

            let mut patch = StatePatch::new().complete();
            patch.messages.push(message);
            patch.error_recovery_log = error_log;
            patch.specialist_handoffs.push(HandoffRecord {
                from_node: self.profile.id.clone(),
                to_node: "end".to_owned(),
                timestamp: Utc::now(),
                task_description: format!("{} closed the conversation", self.profile.display_name),
                tool_call_id: None,
            });
            tracing::info!(specialist = %self.profile.id, score = status.score, "specialist detected completion");
            return Ok(NodeResult::Goto {
                target: GotoTarget::End,
                patch,
            });
        }

        // Handoff budget nearly spent: give the comprehensive final
        // answer instead of another supervisor round-trip.
        if state.handoff_count >= self.config.engine.specialist_handoff_cap {
            let content = format!(
                "{response_text}\n\nThat completes our consultation — you now \
                 have the full set of contacts, programs, and next steps for \
                 your goals. For ongoing support, contact {contact}.",
                contact = self.config.human_loop.escalation_contact,
            );
            let message = Message::assistant(&self.profile.id, content)
                .with_flag("conversation_complete", true)
                .with_flag("final_comprehensive_response", true);

            let mut patch = StatePatch::new().complete();
            patch.messages.push(message);
            patch.error_recovery_log = error_log;
            patch.specialist_handoffs.push(HandoffRecord {
                from_node: self.profile.id.clone(),
                to_node: "end".to_owned(),
                timestamp: Utc::now(),
                task_description: format!(
                    "{} gave the comprehensive final response",
                    self.profile.display_name
                ),
                tool_call_id: None,
            });
            tracing::info!(specialist = %self.profile.id, "handoff budget spent, closing out");
            return Ok(NodeResult::Goto {
                target: GotoTarget::End,
                patch,
            });
        }

        // Normal path: answer and return control to the supervisor.
        let mut patch = StatePatch {
            current_specialist: Some(Some(SUPERVISOR.to_owned())),
            ..Default::default()
        };
        patch
            .messages
            .push(Message::assistant(&self.profile.id, response_text));
        patch.error_recovery_log = error_log;
        patch.specialist_handoffs.push(HandoffRecord {
            from_node: self.profile.id.clone(),
            to_node: SUPERVISOR.to_owned(),
            timestamp: Utc::now(),
            task_description: format!("{} guidance provided", self.profile.display_name),
            tool_call_id: None,
        });

        Ok(NodeResult::Goto {
            target: GotoTarget::Node(SUPERVISOR.to_owned()),
            patch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_providers::{ChatResponse, ScriptedClient};

    fn config() -> Arc<Config> {
        Arc::new(Config::default())
    }

    fn node_with(responses: Vec<ChatResponse>) -> SpecialistNode {
        let profiles = profiles_from_config(&config());
        let veterans = profiles.into_iter().find(|p| p.id == "veterans").unwrap();
        SpecialistNode::new(veterans, config(), Arc::new(ScriptedClient::new(responses)))
    }

    fn state_with_user(text: &str) -> ConversationState {
        let mut s = ConversationState::seed("u", "c");
        s.apply(StatePatch::new().message(Message::user(text)));
        s
    }

    #[tokio::test]
    async fn normal_response_returns_to_supervisor() {
        let node = node_with(vec![ChatResponse::text("Here are veteran programs to explore.")]);
        let state = state_with_user("I'm a veteran looking at solar");
        let result = node.run(&state, &NodeContext::default()).await.unwrap();

        match result {
            NodeResult::Goto { target, patch } => {
                assert_eq!(target, GotoTarget::Node(SUPERVISOR.into()));
                assert_eq!(patch.current_specialist, Some(Some(SUPERVISOR.into())));
                assert_eq!(patch.specialist_handoffs.len(), 1);
                assert_eq!(patch.specialist_handoffs[0].from_node, "veterans");
                assert!(patch.handoff_count.is_none(), "specialists never count handoffs");
            }
            _ => panic!("expected Goto(supervisor)"),
        }
    }

    #[tokio::test]
    async fn strong_completion_signals_close_out() {
        // Response with contact markers (+0.3) plus user gratitude
        // (+0.3) and handoff history keeps score at the specialist
        // threshold.
        let node = node_with(vec![ChatResponse::text(
            "Contact the Clean Energy Veterans Network and apply on their website.",
        )]);
        let mut state = state_with_user("thanks, that's all i needed");
        state.handoff_count = 1;
        let result = node.run(&state, &NodeContext::default()).await.unwrap();

        match result {
            NodeResult::Goto { target, patch } => {
                assert_eq!(target, GotoTarget::End);
                assert_eq!(patch.conversation_complete, Some(true));
            }
            _ => panic!("expected Goto(End)"),
        }
    }

    #[tokio::test]
    async fn handoff_cap_forces_comprehensive_final() {
        let node = node_with(vec![ChatResponse::text("Guidance.")]);
        let mut state = state_with_user("more questions about benefits");
        state.handoff_count = 2;
        let result = node.run(&state, &NodeContext::default()).await.unwrap();

        match result {
            NodeResult::Goto { target, patch } => {
                assert_eq!(target, GotoTarget::End);
                assert_eq!(patch.conversation_complete, Some(true));
                let msg = &patch.messages[0];
                assert!(msg.metadata.flag("final_comprehensive_response"));
            }
            _ => panic!("expected Goto(End)"),
        }
    }

    #[tokio::test]
    async fn provider_failure_uses_fallback_voice() {
        struct FailingClient;

        #[async_trait::async_trait]
        impl cc_providers::LlmClient for FailingClient {
            async fn complete(
                &self,
                _req: ChatRequest,
            ) -> Result<ChatResponse> {
                Err(cc_domain::Error::Provider {
                    provider: "test".into(),
                    message: "down".into(),
                })
            }
            fn provider_id(&self) -> &str {
                "failing"
            }
        }

        let profiles = profiles_from_config(&config());
        let veterans = profiles.into_iter().find(|p| p.id == "veterans").unwrap();
        let node = SpecialistNode::new(veterans, config(), Arc::new(FailingClient));

        let state = state_with_user("veteran help");
        let result = node.run(&state, &NodeContext::default()).await.unwrap();
        match result {
            NodeResult::Goto { patch, .. } => {
                assert_eq!(patch.error_recovery_log.len(), 1);
                assert!(patch.messages[0].content.contains("Veterans Transition Specialist"));
            }
            _ => panic!("expected Goto"),
        }
    }
}
