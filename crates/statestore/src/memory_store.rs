//! In-memory state store for tests and the offline REPL. Shares the
//! revision/merge semantics of the JSON store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use cc_domain::{ConversationState, Error, Result};

use crate::merge::merge_conflict;
use crate::StateStore;

#[derive(Default)]
pub struct MemoryStateStore {
    docs: RwLock<HashMap<(String, String), ConversationState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations (test helper).
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, user_id: &str, conversation_id: &str) -> Result<ConversationState> {
        self.docs
            .read()
            .get(&(user_id.to_owned(), conversation_id.to_owned()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{user_id}:{conversation_id}")))
    }

    async fn save(&self, mut state: ConversationState) -> Result<ConversationState> {
        let key = (state.user_id.clone(), state.conversation_id.clone());
        let mut docs = self.docs.write();
        let saved = match docs.get(&key) {
            Some(current) if current.revision != state.revision => {
                let mut merged = merge_conflict(current, state);
                merged.revision = current.revision + 1;
                merged
            }
            _ => {
                state.revision += 1;
                state
            }
        };
        docs.insert(key, saved.clone());
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{Message, StatePatch};

    #[tokio::test]
    async fn save_bumps_revision() {
        let store = MemoryStateStore::new();
        let state = ConversationState::seed("u", "c");
        let saved = store.save(state).await.unwrap();
        assert_eq!(saved.revision, 1);
        let saved = store.save(saved).await.unwrap();
        assert_eq!(saved.revision, 2);
    }

    #[tokio::test]
    async fn stale_writer_merges_instead_of_clobbering() {
        let store = MemoryStateStore::new();
        let base = store.save(ConversationState::seed("u", "c")).await.unwrap();

        let mut fresh = base.clone();
        fresh.apply(StatePatch::new().message(Message::user("first writer")));
        store.save(fresh).await.unwrap();

        let mut stale = base;
        stale.apply(StatePatch::new().message(Message::user("second writer")));
        let merged = store.save(stale).await.unwrap();

        assert_eq!(merged.messages.len(), 2);
        assert_eq!(merged.revision, 3);
    }

    #[tokio::test]
    async fn conversations_are_isolated() {
        let store = MemoryStateStore::new();
        store.save(ConversationState::seed("u", "c1")).await.unwrap();
        store.save(ConversationState::seed("u", "c2")).await.unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.load("u", "c3").await.is_err());
    }
}
