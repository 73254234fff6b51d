//! Tests for sync_engine module.

#[cfg(test)]
mod tests {
    use super::super::sync_engine::*;
    use crate::accounting::{DayKey, SessionRecord, SessionType};
    use crate::storage::MemoryCache;
    use crate::sync::remote::MemoryRemote;
    use crate::sync::sync_queue::PendingQueue;
    use crate::sync::types::{Collection, DocumentMutation, DrainReport, MutationOp, PendingMutation};
    use chrono::{Duration, TimeZone, Utc};

    fn record(subject: &str, minutes: i64) -> SessionRecord {
        let end = Utc::now();
        SessionRecord::new(
            "u1",
            subject,
            minutes as u64,
            end - Duration::minutes(minutes),
            end,
            SessionType::Continuous,
        )
        .unwrap()
    }

    fn queue_of(n: usize) -> PendingQueue {
        let mut queue = PendingQueue::new();
        for i in 0..n {
            queue.enqueue(PendingMutation::Session(record(&format!("S{i}"), 5)));
        }
        queue
    }

    #[tokio::test]
    async fn test_drain_writes_everything_in_order() {
        let remote = MemoryRemote::new();
        let mut cache = MemoryCache::new();
        let mut queue = queue_of(3);
        queue.enqueue(PendingMutation::Task(DocumentMutation {
            id: "t1".into(),
            op: MutationOp::Upsert,
            data: serde_json::json!({"done": true}),
            updated_at: Utc::now(),
        }));

        let report = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert_eq!(report.written, 4);
        assert!(report.is_complete());
        assert!(queue.is_empty());
        assert_eq!(remote.sessions().len(), 3);
        assert!(remote.document(Collection::Tasks, "t1").is_some());
    }

    #[tokio::test]
    async fn test_failure_stops_and_keeps_tail() {
        let remote = MemoryRemote::new();
        let mut cache = MemoryCache::new();
        let mut queue = queue_of(3);
        let second = match queue.iter().nth(1) {
            Some(PendingMutation::Session(r)) => r.id.clone(),
            _ => unreachable!(),
        };

        // First write succeeds, second fails.
        remote.fail_after(1, 1);
        let report = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert_eq!(report.written, 1);
        assert_eq!(report.remaining, 2);
        assert!(report.error.is_some());
        assert!(matches!(queue.front(), Some(PendingMutation::Session(r)) if r.id == second));
        assert_eq!(PendingQueue::load(&cache).len(), 2);

        let report = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert_eq!(report.written, 2);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_offline_drain_writes_nothing() {
        let remote = MemoryRemote::new();
        remote.set_online(false);
        let mut cache = MemoryCache::new();
        let mut queue = queue_of(2);

        let report = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert_eq!(report.written, 0);
        assert_eq!(report.remaining, 2);
        assert_eq!(remote.write_count(), 0);
    }

    #[tokio::test]
    async fn test_drain_twice_is_idempotent() {
        let remote = MemoryRemote::new();
        let mut cache = MemoryCache::new();
        let mut queue = queue_of(2);

        let first = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert!(first.is_complete());
        let second = drain_pending(&mut queue, &remote, "u1", &mut cache).await;
        assert_eq!(second, DrainReport::default());
        assert!(queue.is_empty());
        assert_eq!(remote.write_count(), 2);
        assert!(PendingQueue::load(&cache).is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_merges_local_and_remote() {
        let remote = MemoryRemote::new();
        let shared = record("Physics", 25);
        let remote_only = record("Physics", 10);
        let local_only = record("Chemistry", 30);
        remote.insert_session(shared.clone());
        remote.insert_session(remote_only);

        let day = shared.day();
        let merged = rehydrate_day(&remote, "u1", &day, &[shared.clone(), local_only.clone()])
            .await
            .unwrap();
        assert_eq!(merged.records.len(), 3);
        assert_eq!(merged.minutes_by_subject["Physics"], 35);
        assert_eq!(merged.minutes_by_subject["Chemistry"], 30);
    }

    #[tokio::test]
    async fn test_rehydrate_offline_errors() {
        let remote = MemoryRemote::new();
        remote.set_online(false);
        let day = DayKey::parse("2024-05-01").unwrap();
        assert!(rehydrate_day(&remote, "u1", &day, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_push_reports_confirmed_prefix() {
        let remote = MemoryRemote::new();
        let queue = queue_of(3);
        let batch = SyncBatch::new("u1", queue.iter().cloned().collect());

        remote.fail_after(2, 1);
        let report = batch.push(&remote).await;
        assert_eq!(report.written, 2);
        assert_eq!(report.remaining, 1);
        assert!(report.error.is_some());

        let confirmed: Vec<_> = batch.confirmed(&report).map(PendingMutation::key).collect();
        let expected: Vec<_> = queue.iter().take(2).map(PendingMutation::key).collect();
        assert_eq!(confirmed, expected);
    }

    #[test]
    fn test_merge_day_sums_unique_records() {
        let shared = record("Physics", 25);
        let merged = merge_day(&[shared.clone()], &[shared, record("Biology", 5)]);
        assert_eq!(merged.records.len(), 2);
        assert_eq!(merged.minutes_by_subject["Physics"], 25);
        assert_eq!(merged.minutes_by_subject["Biology"], 5);
    }

    #[test]
    fn test_scheduler_cadence() {
        let mut scheduler = SyncScheduler::new(60);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert!(scheduler.due(0));
        scheduler.record_run(0, &DrainReport::default(), at);
        assert!(!scheduler.due(59_999));
        assert!(scheduler.due(60_000));
        assert_eq!(scheduler.last_success(), Some(at));

        scheduler.on_disconnect();
        assert!(!scheduler.due(120_000));
        assert!(scheduler.on_reconnect());
        assert!(scheduler.due(120_000));
    }
}
