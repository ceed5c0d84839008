//! Pre-scripted client for tests and offline use. Each `complete` call
//! pops the next response from the front of the queue; when the queue
//! runs dry it falls back to echoing the last user message, so a REPL
//! session never wedges.

use parking_lot::Mutex;

use cc_domain::{Result, Role};

use crate::traits::{ChatRequest, ChatResponse, LlmClient};

pub struct ScriptedClient {
    scripts: Mutex<Vec<ChatResponse>>,
    /// The last request seen, for test inspection.
    last_request: Mutex<Option<ChatRequest>>,
    /// Every system prompt seen, in call order.
    seen_systems: Mutex<Vec<String>>,
}

impl ScriptedClient {
    /// Build from an ordered list of responses.
    pub fn new(scripts: Vec<ChatResponse>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            last_request: Mutex::new(None),
            seen_systems: Mutex::new(Vec::new()),
        }
    }

    /// An empty script: every call echoes.
    pub fn echo() -> Self {
        Self::new(Vec::new())
    }

    /// The most recent request, cloned out for assertions.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request.lock().clone()
    }

    /// All system prompts this client has been called with.
    pub fn seen_systems(&self) -> Vec<String> {
        self.seen_systems.lock().clone()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.scripts.lock().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, req: ChatRequest) -> Result<ChatResponse> {
        let scripted = {
            let mut scripts = self.scripts.lock();
            if scripts.is_empty() {
                None
            } else {
                Some(scripts.remove(0))
            }
        };

        let response = scripted.unwrap_or_else(|| {
            let echo = req
                .messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.as_str())
                .unwrap_or("[no input]");
            ChatResponse::text(format!("Here is guidance on your question: {echo}"))
        });

        self.seen_systems
            .lock()
            .push(req.system.clone().unwrap_or_default());
        *self.last_request.lock() = Some(req);
        Ok(response)
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }
}
