//! Session accountant.
//!
//! Receives elapsed study seconds from the timer and keeps three things
//! consistent: today's per-subject minutes, the session in progress, and
//! the records emitted today. Break time never reaches any of them.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::day::{DayKey, DayPolicy, DayRoll};
use super::progress::SubjectProgress;
use super::record::{SessionRecord, SessionType};
use crate::error::CacheError;
use crate::storage::{keys, load_json, store_json, LocalCache};
use crate::timer::{Phase, TimerMode};

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Recorded(SessionRecord),
    /// Under one minute; nothing written.
    TooShort { seconds: u64 },
    /// Interval sessions are recorded per completed work block instead.
    NotApplicable,
}

/// The session currently being accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSession {
    subject: String,
    started_at: DateTime<Utc>,
    block_started_at: DateTime<Utc>,
    /// Study seconds credited to the current work block so far.
    block_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SessionAccountant {
    user_id: String,
    policy: DayPolicy,
    progress: SubjectProgress,
    current: Option<CurrentSession>,
    records_today: Vec<SessionRecord>,
}

impl SessionAccountant {
    pub fn new(user_id: &str, today: DayKey, policy: DayPolicy, subjects: &[String]) -> Self {
        Self {
            user_id: user_id.to_string(),
            policy,
            progress: SubjectProgress::with_subjects(today, subjects),
            current: None,
            records_today: Vec::new(),
        }
    }

    /// Rehydrate from the cache, then apply the day-boundary policy.
    /// A same-day load keeps the stored totals exactly.
    pub fn load<C: LocalCache + ?Sized>(
        cache: &C,
        user_id: &str,
        today: DayKey,
        policy: DayPolicy,
        subjects: &[String],
    ) -> (Self, DayRoll) {
        let mut accountant = Self::new(user_id, today.clone(), policy, subjects);
        if let Some(stored) = load_json::<SubjectProgress, _>(cache, keys::PROGRESS_TODAY) {
            accountant.progress = stored;
            for subject in subjects {
                accountant.progress.minutes_by_subject.entry(subject.clone()).or_insert(0);
            }
        } else if let Some(last) = load_json::<DayKey, _>(cache, keys::LAST_USED_DATE) {
            accountant.progress.date = last;
        }
        accountant.current = load_json(cache, keys::SESSION_CURRENT);
        accountant.records_today = load_json(cache, keys::SESSIONS_TODAY).unwrap_or_default();

        let roll = accountant.check_day_boundary(&today);
        (accountant, roll)
    }

    /// Write progress, the session in progress, and today's records.
    pub fn persist<C: LocalCache + ?Sized>(&self, cache: &mut C) -> Result<(), CacheError> {
        store_json(cache, keys::PROGRESS_TODAY, &self.progress)?;
        store_json(cache, keys::LAST_USED_DATE, &self.progress.date)?;
        match &self.current {
            Some(current) => store_json(cache, keys::SESSION_CURRENT, current)?,
            None => cache.remove(keys::SESSION_CURRENT)?,
        }
        store_json(cache, keys::SESSIONS_TODAY, &self.records_today)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn progress(&self) -> &SubjectProgress {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut SubjectProgress {
        &mut self.progress
    }

    pub fn records_today(&self) -> &[SessionRecord] {
        &self.records_today
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn current_subject(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.subject.as_str())
    }

    pub fn set_policy(&mut self, policy: DayPolicy) {
        self.policy = policy;
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Open a session for `subject` (fresh start, not a resume).
    pub fn begin_session(&mut self, subject: &str, now: DateTime<Utc>) {
        self.current = Some(CurrentSession {
            subject: subject.to_string(),
            started_at: now,
            block_started_at: now,
            block_secs: 0,
        });
    }

    /// Mark the start of a new work block within the open session.
    pub fn begin_block(&mut self, now: DateTime<Utc>) {
        if let Some(current) = self.current.as_mut() {
            current.block_started_at = now;
            current.block_secs = 0;
        }
    }

    /// Drop the open session without recording it. Minutes already
    /// credited to today's totals stay.
    pub fn abandon_session(&mut self) {
        self.current = None;
    }

    pub fn switch_subject(&mut self, subject: &str) {
        if let Some(current) = self.current.as_mut() {
            current.subject = subject.to_string();
        }
    }

    /// Credit elapsed time to `subject`. Break-phase time is ignored.
    /// Returns the number of whole minutes added to today's totals.
    pub fn on_tick(&mut self, elapsed_secs: u64, subject: &str, mode: TimerMode, phase: Phase) -> u64 {
        if mode == TimerMode::Interval && phase == Phase::Break {
            return 0;
        }
        if elapsed_secs == 0 {
            return 0;
        }
        if let Some(current) = self.current.as_mut() {
            current.block_secs += elapsed_secs;
        }
        let promoted = self.progress.add_seconds(subject, elapsed_secs);
        if promoted > 0 {
            tracing::debug!(subject, promoted, total = self.progress.minutes(subject), "credited minutes");
        }
        promoted
    }

    /// End a session. Continuous sessions become one record of
    /// `floor(total / 60)` minutes; Interval sessions were already recorded
    /// block by block.
    pub fn on_session_stop(
        &mut self,
        subject: &str,
        total_elapsed_secs: u64,
        mode: TimerMode,
        now: DateTime<Utc>,
    ) -> StopOutcome {
        let current = self.current.take();
        if mode == TimerMode::Interval {
            return StopOutcome::NotApplicable;
        }

        let minutes = total_elapsed_secs / 60;
        if minutes == 0 {
            tracing::info!(subject, seconds = total_elapsed_secs, "session too short, discarded");
            return StopOutcome::TooShort {
                seconds: total_elapsed_secs,
            };
        }

        let start = current
            .map(|c| c.started_at)
            .unwrap_or_else(|| now - Duration::seconds(total_elapsed_secs as i64));
        match SessionRecord::new(&self.user_id, subject, minutes, start.min(now), now, SessionType::Continuous) {
            Ok(record) => {
                tracing::info!(subject, minutes, id = %record.id, "session recorded");
                self.records_today.push(record.clone());
                StopOutcome::Recorded(record)
            }
            Err(err) => {
                tracing::warn!(subject, error = %err, "session rejected");
                StopOutcome::TooShort {
                    seconds: total_elapsed_secs,
                }
            }
        }
    }

    /// Record a completed work block. Minutes already credited by ticks
    /// during the block are topped up to the full block length, never
    /// counted twice.
    pub fn on_phase_completed(
        &mut self,
        subject: &str,
        work_duration_minutes: u64,
        now: DateTime<Utc>,
    ) -> Option<SessionRecord> {
        let block_secs = work_duration_minutes * 60;
        let (credited, block_start) = match self.current.as_mut() {
            Some(current) => {
                let credited = current.block_secs;
                current.block_secs = 0;
                (credited, current.block_started_at)
            }
            None => (0, now - Duration::seconds(block_secs as i64)),
        };
        if credited < block_secs {
            self.progress.add_seconds(subject, block_secs - credited);
        }

        match SessionRecord::new(
            &self.user_id,
            subject,
            work_duration_minutes,
            block_start.min(now),
            now,
            SessionType::Interval,
        ) {
            Ok(record) => {
                tracing::info!(subject, minutes = work_duration_minutes, id = %record.id, "work block recorded");
                self.records_today.push(record.clone());
                Some(record)
            }
            Err(err) => {
                tracing::warn!(subject, error = %err, "work block not recorded");
                None
            }
        }
    }

    /// Apply the day-boundary policy against `today`.
    pub fn check_day_boundary(&mut self, today: &DayKey) -> DayRoll {
        let roll = self.progress.roll_to(today, self.policy);
        match &roll {
            DayRoll::SameDay => {}
            DayRoll::Reset { from, to } => {
                tracing::info!(%from, %to, "new day, progress reset");
                self.records_today.clear();
            }
            DayRoll::Advanced { from, to } => {
                tracing::warn!(%from, %to, "stale day-key with recorded minutes, keeping totals");
                self.records_today.retain(|r| &r.day() == to);
            }
        }
        roll
    }

    /// Replace today's record list with a reconciled one.
    pub fn replace_records(&mut self, records: Vec<SessionRecord>) {
        self.records_today = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCache;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    fn accountant() -> SessionAccountant {
        SessionAccountant::new("user-1", day("2024-05-01"), DayPolicy::Conservative, &[])
    }

    #[test]
    fn break_ticks_never_touch_totals() {
        let mut acc = accountant();
        assert_eq!(acc.on_tick(600, "Physics", TimerMode::Interval, Phase::Break), 0);
        assert_eq!(acc.progress().minutes("Physics"), 0);
        assert_eq!(acc.on_tick(120, "Physics", TimerMode::Interval, Phase::Work), 2);
        assert_eq!(acc.progress().minutes("Physics"), 2);
    }

    #[test]
    fn ninety_second_continuous_session_is_one_minute() {
        let mut acc = accountant();
        let now = Utc::now();
        acc.begin_session("Physics", now - Duration::seconds(90));
        acc.on_tick(90, "Physics", TimerMode::Continuous, Phase::Work);
        match acc.on_session_stop("Physics", 90, TimerMode::Continuous, now) {
            StopOutcome::Recorded(record) => {
                assert_eq!(record.duration_minutes, 1);
                assert_eq!(record.subject, "Physics");
                assert_eq!(record.session_type, SessionType::Continuous);
            }
            other => panic!("expected a record, got {other:?}"),
        }
        assert_eq!(acc.records_today().len(), 1);
    }

    #[test]
    fn short_session_is_discarded() {
        let mut acc = accountant();
        acc.begin_session("Physics", Utc::now());
        let outcome = acc.on_session_stop("Physics", 59, TimerMode::Continuous, Utc::now());
        assert_eq!(outcome, StopOutcome::TooShort { seconds: 59 });
        assert!(acc.records_today().is_empty());
    }

    #[test]
    fn interval_stop_emits_nothing() {
        let mut acc = accountant();
        acc.begin_session("Physics", Utc::now());
        let outcome = acc.on_session_stop("Physics", 3_000, TimerMode::Interval, Utc::now());
        assert_eq!(outcome, StopOutcome::NotApplicable);
    }

    #[test]
    fn phase_completion_does_not_double_count() {
        let mut acc = accountant();
        let now = Utc::now();
        acc.begin_session("Physics", now - Duration::minutes(25));
        acc.on_tick(1_500, "Physics", TimerMode::Interval, Phase::Work);
        let record = acc.on_phase_completed("Physics", 25, now).unwrap();
        assert_eq!(record.duration_minutes, 25);
        assert_eq!(acc.progress().minutes("Physics"), 25);
    }

    #[test]
    fn phase_completion_tops_up_missing_ticks() {
        let mut acc = accountant();
        acc.begin_session("Physics", Utc::now());
        acc.on_tick(600, "Physics", TimerMode::Interval, Phase::Work);
        acc.on_phase_completed("Physics", 25, Utc::now()).unwrap();
        assert_eq!(acc.progress().minutes("Physics"), 25);
    }

    #[test]
    fn persist_then_load_same_day_rehydrates() {
        let mut cache = MemoryCache::new();
        let mut acc = accountant();
        acc.on_tick(45 * 60, "Physics", TimerMode::Continuous, Phase::Work);
        acc.persist(&mut cache).unwrap();

        let (loaded, roll) =
            SessionAccountant::load(&cache, "user-1", day("2024-05-01"), DayPolicy::Conservative, &[]);
        assert_eq!(roll, DayRoll::SameDay);
        assert_eq!(loaded.progress().minutes("Physics"), 45);
    }

    #[test]
    fn stale_nonzero_day_advances_without_zeroing() {
        let mut cache = MemoryCache::new();
        let mut acc = accountant();
        acc.on_tick(45 * 60, "Physics", TimerMode::Continuous, Phase::Work);
        acc.persist(&mut cache).unwrap();

        let (loaded, roll) =
            SessionAccountant::load(&cache, "user-1", day("2024-05-02"), DayPolicy::Conservative, &[]);
        assert!(matches!(roll, DayRoll::Advanced { .. }));
        assert_eq!(loaded.progress().date, day("2024-05-02"));
        assert_eq!(loaded.progress().minutes("Physics"), 45);
    }

    #[test]
    fn corrupt_progress_falls_back_to_empty_day() {
        let mut cache = MemoryCache::new();
        cache.set(keys::PROGRESS_TODAY, "][").unwrap();
        let (loaded, _) = SessionAccountant::load(
            &cache,
            "user-1",
            day("2024-05-01"),
            DayPolicy::Conservative,
            &["Physics".to_string()],
        );
        assert_eq!(loaded.progress().minutes("Physics"), 0);
        assert_eq!(loaded.progress().date, day("2024-05-01"));
    }
}
