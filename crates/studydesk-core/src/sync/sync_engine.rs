//! Drains the pending queue and reconciles day progress with the remote.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::accounting::{DayKey, SessionRecord, UserProfile};
use crate::error::RemoteError;
use crate::storage::LocalCache;
use crate::sync::conflict_resolver::resolve;
use crate::sync::remote::RemoteStore;
use crate::sync::sync_queue::PendingQueue;
use crate::sync::types::{Collection, DrainReport, PendingMutation};

async fn write_one<R: RemoteStore + ?Sized>(
    remote: &R,
    user_id: &str,
    mutation: &PendingMutation,
) -> Result<(), RemoteError> {
    match mutation {
        PendingMutation::Session(record) => remote.put_session(user_id, record).await,
        PendingMutation::Task(m) => remote.apply_mutation(user_id, Collection::Tasks, m).await,
        PendingMutation::Event(m) => remote.apply_mutation(user_id, Collection::Events, m).await,
        PendingMutation::ProfileIncrement(delta) => remote.increment_profile(user_id, delta).await,
    }
}

/// Write queued mutations oldest-first. The first failure stops the pass
/// and leaves that entry and everything after it queued, in order. The
/// queue is re-persisted after every confirmed write.
pub async fn drain_pending<R, C>(
    queue: &mut PendingQueue,
    remote: &R,
    user_id: &str,
    cache: &mut C,
) -> DrainReport
where
    R: RemoteStore + ?Sized,
    C: LocalCache + ?Sized,
{
    let mut report = DrainReport::default();

    while let Some(next) = queue.front() {
        match write_one(remote, user_id, next).await {
            Ok(()) => {
                queue.pop_confirmed();
                report.written += 1;
                if let Err(err) = queue.persist(cache) {
                    tracing::warn!(error = %err, "failed to persist pending queue after write");
                }
            }
            Err(err) => {
                tracing::warn!(kind = next.kind(), error = %err, "remote write failed, will retry");
                report.error = Some(err.to_string());
                break;
            }
        }
    }

    report.remaining = queue.len();
    if report.written > 0 {
        tracing::info!(written = report.written, remaining = report.remaining, "drained pending queue");
    }
    report
}

/// A detached copy of the pending queue. Pushing it borrows only the
/// remote, so the queue's owner keeps ticking while writes are in flight.
#[derive(Debug, Clone)]
pub struct SyncBatch {
    user_id: String,
    entries: Vec<PendingMutation>,
}

impl SyncBatch {
    pub fn new(user_id: &str, entries: Vec<PendingMutation>) -> Self {
        Self {
            user_id: user_id.to_string(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write entries oldest-first, stopping at the first failure.
    /// `written` is the length of the confirmed prefix.
    pub async fn push<R: RemoteStore + ?Sized>(&self, remote: &R) -> DrainReport {
        let mut report = DrainReport::default();
        for entry in &self.entries {
            match write_one(remote, &self.user_id, entry).await {
                Ok(()) => report.written += 1,
                Err(err) => {
                    tracing::warn!(kind = entry.kind(), error = %err, "remote write failed, will retry");
                    report.error = Some(err.to_string());
                    break;
                }
            }
        }
        report.remaining = self.entries.len() - report.written;
        report
    }

    /// Entries the remote confirmed according to `report`.
    pub fn confirmed<'a>(&'a self, report: &DrainReport) -> impl Iterator<Item = &'a PendingMutation> + 'a {
        self.entries.iter().take(report.written)
    }
}

/// Result of merging a day's records from both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReconciliation {
    pub records: Vec<SessionRecord>,
    /// Sum of record minutes per subject over the merged set.
    pub minutes_by_subject: BTreeMap<String, u64>,
}

/// Pull `day`'s records from the remote and merge them with the local
/// ones by id.
pub async fn rehydrate_day<R: RemoteStore + ?Sized>(
    remote: &R,
    user_id: &str,
    day: &DayKey,
    local: &[SessionRecord],
) -> Result<DayReconciliation, RemoteError> {
    let remote_records = remote.sessions_for_day(user_id, day).await?;
    let merged = merge_day(local, &remote_records);
    tracing::debug!(day = %day, local = local.len(), remote = remote_records.len(), merged = merged.records.len(), "rehydrated day");
    Ok(merged)
}

/// Merge local and remote records by id and total them per subject.
pub fn merge_day(local: &[SessionRecord], remote: &[SessionRecord]) -> DayReconciliation {
    let records = resolve(local, remote);
    let mut minutes_by_subject = BTreeMap::new();
    for record in &records {
        *minutes_by_subject.entry(record.subject.clone()).or_insert(0) += record.duration_minutes;
    }
    DayReconciliation {
        records,
        minutes_by_subject,
    }
}

/// What to pull for a day, detached from the tracker that asked.
#[derive(Debug, Clone)]
pub struct DayPull {
    pub user_id: String,
    pub day: DayKey,
}

/// Remote side of a day, ready to be merged locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDay {
    pub day: DayKey,
    pub records: Vec<SessionRecord>,
    pub profile: Option<UserProfile>,
}

impl DayPull {
    pub async fn fetch<R: RemoteStore + ?Sized>(&self, remote: &R) -> Result<RemoteDay, RemoteError> {
        let records = remote.sessions_for_day(&self.user_id, &self.day).await?;
        let profile = remote.fetch_profile(&self.user_id).await?;
        Ok(RemoteDay {
            day: self.day.clone(),
            records,
            profile,
        })
    }
}

/// Tracks when the next drain is due.
#[derive(Debug, Clone)]
pub struct SyncScheduler {
    interval_ms: u64,
    online: bool,
    last_run_ms: Option<u64>,
    last_success: Option<DateTime<Utc>>,
}

impl SyncScheduler {
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_ms: interval_secs.saturating_mul(1000),
            online: true,
            last_run_ms: None,
            last_success: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    pub fn restore_last_success(&mut self, at: Option<DateTime<Utc>>) {
        self.last_success = at;
    }

    /// Connectivity came back; a drain should run right away.
    pub fn on_reconnect(&mut self) -> bool {
        self.online = true;
        true
    }

    pub fn on_disconnect(&mut self) {
        self.online = false;
    }

    /// Whether the periodic drain is due at `now_ms`.
    pub fn due(&self, now_ms: u64) -> bool {
        self.online
            && self
                .last_run_ms
                .map_or(true, |last| now_ms.saturating_sub(last) >= self.interval_ms)
    }

    pub fn record_run(&mut self, now_ms: u64, report: &DrainReport, at: DateTime<Utc>) {
        self.last_run_ms = Some(now_ms);
        if report.error.is_none() {
            self.last_success = Some(at);
        }
    }
}
