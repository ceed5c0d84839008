//! Conversation state persistence.
//!
//! One JSON document per `(user_id, conversation_id)`. Saves are atomic
//! (temp file + rename) and optimistic: each document carries a
//! `revision`; when a save observes a newer revision than it loaded,
//! overwrite fields take the later writer and append-only sequences are
//! merged so neither writer's appends are lost.

pub mod json_store;
pub mod memory_store;
pub mod merge;

pub use json_store::JsonStateStore;
pub use memory_store::MemoryStateStore;

use async_trait::async_trait;
use cc_domain::{ConversationState, Result};

/// Canonical persistence interface for conversation state.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state for a conversation.
    ///
    /// Errors: `NotFound` when no document exists (callers seed an empty
    /// state), `Corrupt` when the document cannot be decoded, `Io`
    /// otherwise.
    async fn load(&self, user_id: &str, conversation_id: &str) -> Result<ConversationState>;

    /// Persist a state atomically and return the stored value (with its
    /// bumped revision, and any conflict-merge applied).
    async fn save(&self, state: ConversationState) -> Result<ConversationState>;
}
