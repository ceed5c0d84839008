//! LLM client abstraction.
//!
//! The engine consumes one trait, [`LlmClient`]: a text completion plus
//! optional tool-call requests. Two implementations ship: an
//! OpenAI-compatible HTTP adapter and a scripted client for tests and
//! offline use.

pub mod openai_compat;
pub mod scripted;
pub mod traits;

pub use openai_compat::OpenAiCompatClient;
pub use scripted::ScriptedClient;
pub use traits::{ChatRequest, ChatResponse, LlmClient};
