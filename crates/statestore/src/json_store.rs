//! File-backed state store: one JSON document per conversation under a
//! base directory, atomic writes via temp file + rename.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use cc_domain::{ConversationState, Error, Result};

use crate::merge::merge_conflict;
use crate::StateStore;

pub struct JsonStateStore {
    base_dir: PathBuf,
    /// Serializes the read-merge-write cycle within this process.
    /// Cross-process coordination is the revision counter's job.
    write_lock: Mutex<()>,
}

impl JsonStateStore {
    /// Create the store, ensuring the base directory exists.
    pub fn new(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir).map_err(Error::Io)?;
        tracing::info!(path = %base_dir.display(), "state store ready");
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn doc_path(&self, user_id: &str, conversation_id: &str) -> PathBuf {
        self.base_dir.join(format!(
            "{}__{}.json",
            sanitize(user_id),
            sanitize(conversation_id)
        ))
    }

    fn read_doc(&self, path: &Path) -> Result<Option<ConversationState>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let state = serde_json::from_str(&raw)
            .map_err(|e| Error::Corrupt(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }

    fn write_doc(&self, path: &Path, state: &ConversationState) -> Result<()> {
        let json = serde_json::to_string_pretty(state).map_err(Error::Json)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(Error::Io)?;
        std::fs::rename(&tmp, path).map_err(Error::Io)?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self, user_id: &str, conversation_id: &str) -> Result<ConversationState> {
        let path = self.doc_path(user_id, conversation_id);
        self.read_doc(&path)?
            .ok_or_else(|| Error::NotFound(format!("{user_id}:{conversation_id}")))
    }

    async fn save(&self, mut state: ConversationState) -> Result<ConversationState> {
        let path = self.doc_path(&state.user_id, &state.conversation_id);
        let _guard = self.write_lock.lock();

        let persisted = self.read_doc(&path)?;
        match persisted {
            Some(current) if current.revision != state.revision => {
                // A concurrent writer got in first: keep its appends.
                tracing::debug!(
                    conversation_id = %state.conversation_id,
                    loaded = state.revision,
                    current = current.revision,
                    "conflicting save, merging appends"
                );
                let mut merged = merge_conflict(&current, state);
                merged.revision = current.revision + 1;
                self.write_doc(&path, &merged)?;
                Ok(merged)
            }
            _ => {
                state.revision += 1;
                self.write_doc(&path, &state)?;
                Ok(state)
            }
        }
    }
}

/// Map an opaque identifier to a safe, injective file-name fragment.
fn sanitize(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for b in id.bytes() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' => out.push(b as char),
            other => out.push_str(&format!("%{other:02x}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{Message, StatePatch};

    fn store() -> (tempfile::TempDir, JsonStateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn load_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load("u1", "c1").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let mut state = ConversationState::seed("u1", "c1");
        state.apply(StatePatch::new().message(Message::user("hello")));

        let saved = store.save(state).await.unwrap();
        assert_eq!(saved.revision, 1);

        let loaded = store.load("u1", "c1").await.unwrap();
        assert_eq!(loaded.revision, 1);
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.messages[0].content, "hello");
    }

    #[tokio::test]
    async fn conflicting_saves_preserve_both_appends() {
        let (_dir, store) = store();
        let seed = ConversationState::seed("u1", "c1");
        let base = store.save(seed).await.unwrap();

        let mut a = base.clone();
        a.apply(StatePatch::new().message(Message::assistant("supervisor", "a")));
        let mut b = base.clone();
        b.apply(StatePatch::new().message(Message::assistant("veterans", "b")));

        store.save(a).await.unwrap();
        let merged = store.save(b).await.unwrap();

        assert_eq!(merged.revision, 3);
        assert_eq!(merged.messages.len(), 2);
    }

    #[tokio::test]
    async fn corrupt_document_escalates() {
        let (dir, store) = store();
        let path = dir.path().join(format!("{}__{}.json", "u1", "c1"));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(store.load("u1", "c1").await, Err(Error::Corrupt(_))));
    }

    #[tokio::test]
    async fn odd_identifiers_are_sanitized() {
        let (_dir, store) = store();
        let state = ConversationState::seed("user/../../etc", "c 1");
        store.save(state).await.unwrap();
        let loaded = store.load("user/../../etc", "c 1").await.unwrap();
        assert_eq!(loaded.user_id, "user/../../etc");
    }

    #[test]
    fn sanitize_is_injective_for_distinct_ids() {
        assert_ne!(sanitize("a_b"), sanitize("a%5fb"));
        assert_ne!(sanitize("a/b"), sanitize("a_b"));
    }
}
