//! Best-effort episodic memory.
//!
//! The supervisor retrieves relevant entries before each LLM call and
//! stores the user query afterwards. Memory failures are logged and
//! swallowed — they never block the turn pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use cc_domain::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One stored memory entry for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    /// Where the entry came from (e.g. "user_query", "session_summary").
    pub source: String,
    pub importance: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl MemoryEntry {
    pub fn new(content: impl Into<String>, source: &str, importance: f64) -> Self {
        Self {
            content: content.into(),
            source: source.to_owned(),
            importance,
            created_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Store trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Retrieve up to `limit` entries relevant to `context`, most
    /// recent first.
    async fn retrieve(&self, user_id: &str, context: &str, limit: usize)
        -> Result<Vec<MemoryEntry>>;

    /// Store an entry for a user.
    async fn store(&self, user_id: &str, entry: MemoryEntry) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Keyword-overlap retrieval over an in-process map. Good enough for
/// the REPL and tests; a real deployment plugs in a remote store behind
/// the same trait.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Vec<MemoryEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn retrieve(
        &self,
        user_id: &str,
        context: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>> {
        let entries = self.entries.read();
        let Some(user_entries) = entries.get(user_id) else {
            return Ok(Vec::new());
        };

        let context_lower = context.to_lowercase();
        let needles: Vec<&str> = context_lower.split_whitespace().collect();

        let mut scored: Vec<(usize, &MemoryEntry)> = user_entries
            .iter()
            .map(|e| {
                let content = e.content.to_lowercase();
                let hits = needles.iter().filter(|n| content.contains(**n)).count();
                (hits, e)
            })
            .filter(|(hits, _)| *hits > 0)
            .collect();

        // Highest overlap first, then most recent.
        scored.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.created_at.cmp(&a.1.created_at))
        });

        Ok(scored.into_iter().take(limit).map(|(_, e)| e.clone()).collect())
    }

    async fn store(&self, user_id: &str, entry: MemoryEntry) -> Result<()> {
        self.entries
            .write()
            .entry(user_id.to_owned())
            .or_default()
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn retrieve_unknown_user_is_empty() {
        let store = InMemoryStore::new();
        let entries = store.retrieve("ghost", "anything", 3).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn retrieve_ranks_by_overlap() {
        let store = InMemoryStore::new();
        store
            .store("u1", MemoryEntry::new("veteran solar installer training", "user_query", 0.8))
            .await
            .unwrap();
        store
            .store("u1", MemoryEntry::new("resume review notes", "user_query", 0.5))
            .await
            .unwrap();

        let entries = store
            .retrieve("u1", "veteran training programs", 5)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].content.contains("veteran"));
    }

    #[tokio::test]
    async fn limit_is_respected() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store
                .store("u1", MemoryEntry::new(format!("career note {i}"), "user_query", 0.5))
                .await
                .unwrap();
        }
        let entries = store.retrieve("u1", "career", 2).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
