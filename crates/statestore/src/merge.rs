//! Conflict-merge for concurrent saves of the same conversation.
//!
//! Both writers loaded the same base revision, so each sequence is
//! `base ++ own_appends`. The merge recovers the base as the common
//! prefix, keeps it byte-identical, and interleaves the two writers'
//! appends by timestamp (stable: the persisted writer wins ties).
//! Overwrite fields take the incoming (later) writer.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use cc_domain::{ConversationState, Message};

/// Merge an incoming save against a newer persisted revision.
pub fn merge_conflict(persisted: &ConversationState, incoming: ConversationState) -> ConversationState {
    let mut out = incoming;

    out.messages = merge_messages(&persisted.messages, &out.messages);
    out.tools_used = merge_plain(&persisted.tools_used, &out.tools_used);
    out.specialist_handoffs = merge_timestamped(
        &persisted.specialist_handoffs,
        &out.specialist_handoffs,
        |r| r.timestamp,
    );
    out.resource_recommendations = merge_timestamped(
        &persisted.resource_recommendations,
        &out.resource_recommendations,
        |r| r.timestamp,
    );
    out.error_recovery_log =
        merge_timestamped(&persisted.error_recovery_log, &out.error_recovery_log, |r| {
            r.timestamp
        });
    out.reflection_history =
        merge_timestamped(&persisted.reflection_history, &out.reflection_history, |r| {
            r.timestamp
        });

    // Counters stay monotonic across writers.
    out.handoff_count = out.handoff_count.max(persisted.handoff_count);
    out
}

fn common_prefix_len<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Sequences without timestamps: base, then the persisted writer's
/// appends, then the incoming writer's.
fn merge_plain<T: Clone + PartialEq>(persisted: &[T], incoming: &[T]) -> Vec<T> {
    let p = common_prefix_len(persisted, incoming);
    let mut out = persisted.to_vec();
    out.extend_from_slice(&incoming[p..]);
    out
}

/// Timestamped records: base, then the two append suffixes interleaved
/// by timestamp. Within one writer, order is preserved.
fn merge_timestamped<T, F>(persisted: &[T], incoming: &[T], ts: F) -> Vec<T>
where
    T: Clone + PartialEq,
    F: Fn(&T) -> DateTime<Utc>,
{
    let p = common_prefix_len(persisted, incoming);
    let mut out = persisted[..p].to_vec();
    out.extend(interleave(&persisted[p..], &incoming[p..], ts));
    out
}

/// Messages dedupe by id (a resumed turn may re-append the same record)
/// before the timestamp interleave.
fn merge_messages(persisted: &[Message], incoming: &[Message]) -> Vec<Message> {
    let p = persisted
        .iter()
        .zip(incoming.iter())
        .take_while(|(a, b)| a.id == b.id)
        .count();
    let mut out = persisted[..p].to_vec();

    let base_ids: HashSet<_> = persisted[..p].iter().map(|m| m.id).collect();
    let persisted_suffix: Vec<Message> = persisted[p..].to_vec();
    let suffix_ids: HashSet<_> = persisted_suffix.iter().map(|m| m.id).collect();
    let incoming_suffix: Vec<Message> = incoming[p..]
        .iter()
        .filter(|m| !base_ids.contains(&m.id) && !suffix_ids.contains(&m.id))
        .cloned()
        .collect();

    out.extend(interleave(&persisted_suffix, &incoming_suffix, |m| {
        m.metadata.timestamp
    }));
    out
}

/// Standard two-way merge of timestamp-ordered runs; `a` wins ties.
fn interleave<T, F>(a: &[T], b: &[T], ts: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> DateTime<Utc>,
{
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if ts(&a[i]) <= ts(&b[j]) {
            out.push(a[i].clone());
            i += 1;
        } else {
            out.push(b[j].clone());
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_domain::{Message, StatePatch};

    fn base_state() -> ConversationState {
        let mut s = ConversationState::seed("u1", "c1");
        s.apply(StatePatch::new().message(Message::user("base")).tool_used("t0"));
        s
    }

    #[test]
    fn both_writers_appends_survive() {
        let base = base_state();

        let mut a = base.clone();
        a.apply(StatePatch::new().message(Message::assistant("supervisor", "from a")));
        a.revision = 1;

        let mut b = base.clone();
        b.apply(StatePatch::new().message(Message::assistant("veterans", "from b")));

        let merged = merge_conflict(&a, b);
        assert_eq!(merged.messages.len(), 3);
        let contents: Vec<_> = merged.messages.iter().map(|m| m.content.as_str()).collect();
        assert!(contents.contains(&"from a"));
        assert!(contents.contains(&"from b"));
        assert_eq!(merged.messages[0].content, "base");
    }

    #[test]
    fn duplicate_message_ids_are_not_repeated() {
        let base = base_state();
        let mut a = base.clone();
        let shared = Message::assistant("supervisor", "shared");
        a.apply(StatePatch::new().message(shared.clone()));

        let mut b = base.clone();
        b.apply(StatePatch::new().message(shared));

        let merged = merge_conflict(&a, b);
        assert_eq!(merged.messages.len(), 2);
    }

    #[test]
    fn plain_sequences_keep_both_suffixes() {
        let base = base_state();
        let mut a = base.clone();
        a.apply(StatePatch::new().tool_used("from_a"));
        let mut b = base.clone();
        b.apply(StatePatch::new().tool_used("from_b"));

        let merged = merge_conflict(&a, b);
        assert_eq!(merged.tools_used, vec!["t0", "from_a", "from_b"]);
    }

    #[test]
    fn handoff_count_is_monotonic_across_writers() {
        let base = base_state();
        let mut a = base.clone();
        a.handoff_count = 2;
        let mut b = base.clone();
        b.handoff_count = 1;

        let merged = merge_conflict(&a, b);
        assert_eq!(merged.handoff_count, 2);
    }
}
