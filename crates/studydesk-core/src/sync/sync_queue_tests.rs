//! Tests for sync_queue module.

#[cfg(test)]
mod tests {
    use super::super::sync_queue::*;
    use crate::accounting::{ProfileDelta, SessionRecord, SessionType};
    use crate::storage::{keys, LocalCache, MemoryCache};
    use crate::sync::types::{DocumentMutation, MutationOp, PendingMutation};
    use chrono::{Duration, Utc};

    fn session(subject: &str) -> PendingMutation {
        let end = Utc::now();
        PendingMutation::Session(
            SessionRecord::new("u", subject, 5, end - Duration::minutes(5), end, SessionType::Continuous)
                .unwrap(),
        )
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = PendingQueue::new();
        queue.enqueue(session("Physics"));
        queue.enqueue(PendingMutation::Task(DocumentMutation {
            id: "t1".into(),
            op: MutationOp::Upsert,
            data: serde_json::json!({"title": "Revise optics"}),
            updated_at: Utc::now(),
        }));
        queue.enqueue(session("Biology"));

        let kinds: Vec<_> = queue.iter().map(|m| m.kind()).collect();
        assert_eq!(kinds, vec!["session", "task", "session"]);
        assert!(matches!(queue.pop_confirmed(), Some(PendingMutation::Session(r)) if r.subject == "Physics"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_duplicate_enqueue_ignored() {
        let mut queue = PendingQueue::new();
        let entry = session("Physics");
        assert!(queue.enqueue(entry.clone()));
        assert!(!queue.enqueue(entry));
        assert_eq!(queue.len(), 1);

        let delta = PendingMutation::ProfileIncrement(ProfileDelta {
            session_id: "s1".into(),
            subject: "Physics".into(),
            minutes: 5,
        });
        assert!(queue.enqueue(delta.clone()));
        assert!(!queue.enqueue(delta));
    }

    #[test]
    fn test_confirm_removes_only_that_entry() {
        let mut queue = PendingQueue::new();
        let first = session("Physics");
        queue.enqueue(first.clone());
        queue.enqueue(session("Chemistry"));
        queue.enqueue(session("Biology"));

        assert!(queue.confirm(&first.key()));
        assert!(!queue.confirm(&first.key()));
        assert_eq!(queue.len(), 2);
        assert!(matches!(queue.front(), Some(PendingMutation::Session(r)) if r.subject == "Chemistry"));
    }

    #[test]
    fn test_persist_and_load() {
        let mut cache = MemoryCache::new();
        let mut queue = PendingQueue::new();
        queue.enqueue(session("Physics"));
        queue.enqueue(session("Chemistry"));
        queue.persist(&mut cache).unwrap();

        let loaded = PendingQueue::load(&cache);
        assert_eq!(loaded.len(), 2);
        assert!(matches!(loaded.front(), Some(PendingMutation::Session(r)) if r.subject == "Physics"));
    }

    #[test]
    fn test_corrupt_blob_loads_empty() {
        let mut cache = MemoryCache::new();
        cache.set(keys::PENDING_QUEUE, "[{\"kind\":\"nonsense\"}]").unwrap();
        assert!(PendingQueue::load(&cache).is_empty());
    }
}
