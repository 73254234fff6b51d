//! The study tracker store.
//!
//! One owned object holds the timer, the accountant, the pending queue and
//! the local profile mirror. Hosts change it only through [`Action`]s, and
//! every dispatch ends in exactly one call to the canonical `save()`.
//!
//! ```ignore
//! let mut tracker = StudyTracker::load(SqliteCache::open_default()?, SystemClock, config);
//! tracker.dispatch(Action::Start { resume: false });
//! // On the host's tick cadence:
//! tracker.dispatch(Action::Tick);
//! // Whenever the scheduler says so, off the tick path:
//! let batch = tracker.begin_sync();
//! let report = batch.push(&remote).await;
//! tracker.finish_sync(&batch, report);
//! ```

use serde::{Deserialize, Serialize};

use crate::accounting::{
    DayRoll, ProfileDelta, SessionAccountant, SessionRecord, StopOutcome, SubjectProgress, UserProfile,
};
use crate::clock::{to_utc, Clock};
use crate::error::{CacheError, RemoteError, ValidationError};
use crate::events::Event;
use crate::storage::{keys, load_json, store_json, Config, LocalCache};
use crate::sync::{
    merge_day, Collection, DayPull, DayReconciliation, DocumentMutation, DrainReport, PendingMutation,
    PendingQueue, RemoteDay, RemoteStore, SyncBatch, SyncScheduler, SyncStatus,
};
use crate::timer::{Phase, TickOutcome, TimerEngine, TimerEvent, TimerMode, TimerSnapshot};

/// Everything a host can ask the tracker to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start { resume: bool },
    Pause,
    Stop,
    Reset,
    SwitchMode(TimerMode),
    SetSubject(String),
    Tick,
    /// Host became visible again.
    Foreground,
    /// Host was hidden; time keeps running.
    Background,
    /// Host is about to exit; flush everything.
    BeforeTerminate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimerBlob {
    subject: String,
    engine: TimerEngine,
}

/// Read-only view for hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub subject: String,
    pub timer: TimerSnapshot,
    pub today: SubjectProgress,
    pub pending: usize,
}

pub struct StudyTracker<C: LocalCache, K: Clock> {
    cache: C,
    clock: K,
    config: Config,
    engine: TimerEngine,
    accountant: SessionAccountant,
    queue: PendingQueue,
    profile: UserProfile,
    subject: String,
    scheduler: SyncScheduler,
    last_day_check_ms: u64,
    degraded: bool,
    outbox: Vec<Event>,
}

impl<C: LocalCache, K: Clock> StudyTracker<C, K> {
    /// Rehydrate from the cache. Missing or corrupt blobs fall back to
    /// defaults; the day-boundary policy runs once here.
    pub fn load(cache: C, clock: K, config: Config) -> Self {
        let now = clock.now_ms();
        let interval = config.interval_config();

        let (engine, subject) = match load_json::<TimerBlob, _>(&cache, keys::TIMER_STATE) {
            Some(mut blob) => {
                blob.engine.normalize();
                if blob.engine.interval() != &interval {
                    blob.engine.set_interval_config(interval);
                }
                (blob.engine, blob.subject)
            }
            None => (
                TimerEngine::new(config.timer.default_mode, interval),
                config.timer.default_subject.clone(),
            ),
        };
        let mut engine = engine.with_debounce_ms(config.timer.phase_debounce_ms);
        engine.restore_paused(load_json(&cache, keys::TIMER_PAUSED));

        let (accountant, roll) = SessionAccountant::load(
            &cache,
            &config.sync.user_id,
            clock.today(),
            config.progress.day_policy,
            &config.progress.subjects,
        );
        let queue = PendingQueue::load(&cache);
        let mut profile: UserProfile = load_json(&cache, keys::PROFILE_LOCAL).unwrap_or_default();
        if profile.display_name.is_empty() {
            profile.display_name = config.sync.display_name.clone();
        }
        let mut scheduler = SyncScheduler::new(config.sync.interval_secs);
        scheduler.restore_last_success(load_json(&cache, keys::LAST_SYNC));
        if config.sync.endpoint.is_none() {
            scheduler.on_disconnect();
        }

        let mut outbox = Vec::new();
        if roll.changed_day() {
            outbox.push(Event::DayRolled { roll });
        }

        tracing::debug!(
            mode = %engine.mode(),
            running = engine.is_running(),
            pending = queue.len(),
            "tracker rehydrated"
        );

        Self {
            cache,
            clock,
            config,
            engine,
            accountant,
            queue,
            profile,
            subject,
            scheduler,
            last_day_check_ms: now,
            degraded: false,
            outbox,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn progress(&self) -> &SubjectProgress {
        self.accountant.progress()
    }

    pub fn records_today(&self) -> &[SessionRecord] {
        self.accountant.records_today()
    }

    pub fn queue(&self) -> &PendingQueue {
        &self.queue
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True once a cache write has failed; state is then memory-only.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            subject: self.subject.clone(),
            timer: self.engine.snapshot(),
            today: self.accountant.progress().clone(),
            pending: self.queue.len(),
        }
    }

    pub fn sync_status(&self) -> SyncStatus {
        SyncStatus {
            last_sync_at: self.scheduler.last_success(),
            pending_count: self.queue.len(),
            online: self.scheduler.is_online(),
        }
    }

    pub fn into_cache(self) -> C {
        self.cache
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Apply one action, then save once. Returns the events it produced.
    pub fn dispatch(&mut self, action: Action) -> Vec<Event> {
        let now = self.clock.now_ms();
        self.check_day_if_due(now);

        match action {
            Action::Start { resume } => self.start(resume, now),
            Action::Pause => {
                if let Some(event) = self.engine.pause(now) {
                    if let TimerEvent::Paused { flushed, .. } = &event {
                        self.account(*flushed, now);
                    }
                    self.outbox.push(Event::Timer { event });
                }
            }
            Action::Stop => self.finish_session(now),
            Action::Reset => {
                if let Some(event) = self.engine.reset() {
                    self.accountant.abandon_session();
                    self.outbox.push(Event::Timer { event });
                } else {
                    tracing::debug!("reset ignored while hidden");
                }
            }
            Action::SwitchMode(mode) => {
                self.finish_session(now);
                if let Some(event) = self.engine.switch_mode(mode) {
                    self.outbox.push(Event::Timer { event });
                }
            }
            Action::SetSubject(subject) => {
                self.tick(now);
                self.accountant.switch_subject(&subject);
                self.subject = subject;
            }
            Action::Tick => self.tick(now),
            Action::Foreground => {
                self.engine.set_visible(true);
                if self.config.timer.reanchor_on_foreground {
                    self.engine.reanchor(now);
                } else {
                    self.tick(now);
                }
            }
            Action::Background => {
                self.tick(now);
                self.engine.set_visible(false);
            }
            Action::BeforeTerminate => self.tick(now),
        }

        self.save();
        std::mem::take(&mut self.outbox)
    }

    fn start(&mut self, resume: bool, now: u64) {
        if self.engine.is_running() {
            return;
        }
        if !resume && self.engine.paused_snapshot().is_some() {
            // A fresh start closes the paused session instead of dropping it.
            self.finish_session(now);
        }
        if let Some(event) = self.engine.start(resume, now) {
            if let TimerEvent::Started { resumed: false, .. } = event {
                self.accountant.begin_session(&self.subject, to_utc(now));
            }
            tracing::info!(subject = %self.subject, mode = %self.engine.mode(), "timer started");
            self.outbox.push(Event::Timer { event });
        }
    }

    fn finish_session(&mut self, now: u64) {
        let Some(event) = self.engine.stop(now) else {
            return;
        };
        if let TimerEvent::Stopped {
            mode,
            total_elapsed_secs,
            flushed,
        } = &event
        {
            if let Some(flushed) = flushed {
                self.account(*flushed, now);
            }
            match self
                .accountant
                .on_session_stop(&self.subject, *total_elapsed_secs, *mode, to_utc(now))
            {
                StopOutcome::Recorded(record) => self.emit_record(record),
                StopOutcome::TooShort { seconds } => {
                    self.outbox.push(Event::SessionTooShort { seconds });
                }
                StopOutcome::NotApplicable => {}
            }
        }
        self.outbox.push(Event::Timer { event });
    }

    fn tick(&mut self, now: u64) {
        let outcome = self.engine.tick(now);
        self.account(outcome, now);
    }

    /// Feed one tick's worth of time into the accountant.
    fn account(&mut self, outcome: TickOutcome, now: u64) {
        self.accountant
            .on_tick(outcome.elapsed_secs, &self.subject, outcome.mode, outcome.phase);

        if let Some(transition) = outcome.transition {
            tracing::info!(from = ?transition.from, to = ?transition.to, long_break = transition.long_break, "phase changed");
            if transition.from == Phase::Work {
                let minutes = transition.work_secs / 60;
                if let Some(record) = self.accountant.on_phase_completed(&self.subject, minutes, to_utc(now)) {
                    self.emit_record(record);
                }
            } else {
                self.accountant.begin_block(to_utc(now));
            }
            self.outbox.push(Event::PhaseChanged { transition });
        }
    }

    /// Queue a new record and its profile increment for the remote.
    fn emit_record(&mut self, record: SessionRecord) {
        let delta = ProfileDelta::for_record(&record);
        self.profile.apply(&delta);
        self.queue.enqueue(PendingMutation::Session(record.clone()));
        self.queue.enqueue(PendingMutation::ProfileIncrement(delta));
        self.outbox.push(Event::SessionRecorded { record });
        if !self.scheduler.is_online() {
            self.outbox.push(Event::QueuedOffline {
                pending: self.queue.len(),
            });
        }
    }

    fn check_day_if_due(&mut self, now: u64) {
        let interval_ms = self.config.progress.day_check_interval_secs.saturating_mul(1000);
        if now.saturating_sub(self.last_day_check_ms) < interval_ms {
            return;
        }
        self.last_day_check_ms = now;
        let roll = self.accountant.check_day_boundary(&self.clock.today());
        if roll != DayRoll::SameDay {
            self.outbox.push(Event::DayRolled { roll });
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn try_save(&mut self) -> Result<(), CacheError> {
        let blob = TimerBlob {
            subject: self.subject.clone(),
            engine: self.engine.clone(),
        };
        store_json(&mut self.cache, keys::TIMER_STATE, &blob)?;
        match self.engine.paused_snapshot() {
            Some(paused) => store_json(&mut self.cache, keys::TIMER_PAUSED, paused)?,
            None => self.cache.remove(keys::TIMER_PAUSED)?,
        }
        self.accountant.persist(&mut self.cache)?;
        self.queue.persist(&mut self.cache)?;
        if let Some(at) = self.scheduler.last_success() {
            store_json(&mut self.cache, keys::LAST_SYNC, &at)?;
        }
        store_json(&mut self.cache, keys::PROFILE_LOCAL, &self.profile)
    }

    /// The single place tracker state reaches the cache. A failing cache
    /// leaves the tracker running on in-memory state.
    fn save(&mut self) {
        match self.try_save() {
            Ok(()) => tracing::debug!("tracker state saved"),
            Err(err) => {
                tracing::warn!(error = %err, "local cache write failed, continuing in memory");
                if !self.degraded {
                    self.outbox.push(Event::CacheDegraded {
                        message: err.to_string(),
                    });
                }
                self.degraded = true;
            }
        }
    }

    // ── Sync ─────────────────────────────────────────────────────────

    pub fn set_online(&mut self, online: bool) {
        if online {
            self.scheduler.on_reconnect();
        } else {
            self.scheduler.on_disconnect();
        }
    }

    /// Whether the periodic drain is due.
    pub fn sync_due(&self) -> bool {
        self.scheduler.due(self.clock.now_ms())
    }

    /// Queue a task or event change for the remote. Returns false if the
    /// same change is already queued.
    pub fn enqueue_mutation(
        &mut self,
        collection: Collection,
        mutation: DocumentMutation,
    ) -> Result<bool, ValidationError> {
        let pending = match collection {
            Collection::Tasks => PendingMutation::Task(mutation),
            Collection::Events => PendingMutation::Event(mutation),
            Collection::Sessions => {
                return Err(ValidationError::InvalidValue {
                    field: "collection".to_string(),
                    message: "session records are created by the timer".to_string(),
                })
            }
        };
        let added = self.queue.enqueue(pending);
        if added {
            self.save();
        }
        Ok(added)
    }

    /// Copy of the pending queue to push without borrowing the tracker.
    pub fn begin_sync(&self) -> SyncBatch {
        SyncBatch::new(&self.config.sync.user_id, self.queue.iter().cloned().collect())
    }

    /// Drop the entries `report` confirmed and record the run. Entries
    /// queued while the batch was in flight stay queued.
    pub fn finish_sync(&mut self, batch: &SyncBatch, mut report: DrainReport) -> DrainReport {
        for entry in batch.confirmed(&report) {
            self.queue.confirm(&entry.key());
        }
        report.remaining = self.queue.len();
        let now = self.clock.now_ms();
        self.scheduler.record_run(now, &report, to_utc(now));
        if report.written > 0 {
            tracing::info!(written = report.written, remaining = report.remaining, "drained pending queue");
        }
        self.save();
        report
    }

    /// Push and confirm in one call. Holds the tracker until the remote
    /// answers; hosts that keep ticking use `begin_sync`/`finish_sync`.
    pub async fn sync<R: RemoteStore + ?Sized>(&mut self, remote: &R) -> DrainReport {
        let batch = self.begin_sync();
        let report = batch.push(remote).await;
        self.finish_sync(&batch, report)
    }

    /// Connectivity returned: mark online and drain immediately.
    pub async fn on_reconnect<R: RemoteStore + ?Sized>(&mut self, remote: &R) -> DrainReport {
        self.scheduler.on_reconnect();
        self.sync(remote).await
    }

    /// What to fetch to reconcile the current day.
    pub fn begin_reconcile(&self) -> DayPull {
        DayPull {
            user_id: self.config.sync.user_id.clone(),
            day: self.accountant.progress().date.clone(),
        }
    }

    /// Merge a fetched day into local state. Subject totals only rise to
    /// what the merged records account for. Returns `None` if the day
    /// rolled over while the fetch was in flight.
    pub fn finish_reconcile(&mut self, remote_day: RemoteDay) -> Option<DayReconciliation> {
        if remote_day.day != self.accountant.progress().date {
            tracing::warn!(fetched = %remote_day.day, "day changed during reconcile, discarding");
            return None;
        }
        let merged = merge_day(self.accountant.records_today(), &remote_day.records);
        self.accountant.replace_records(merged.records.clone());
        for (subject, minutes) in &merged.minutes_by_subject {
            self.accountant.progress_mut().merge_max(subject, *minutes);
        }
        if let Some(remote_profile) = remote_day.profile {
            if remote_profile.total_study_time >= self.profile.total_study_time {
                self.profile = remote_profile;
            }
        }
        self.save();
        Some(merged)
    }

    /// Fetch and merge in one call, holding the tracker while fetching.
    pub async fn reconcile_today<R: RemoteStore + ?Sized>(
        &mut self,
        remote: &R,
    ) -> Result<Option<DayReconciliation>, RemoteError> {
        let remote_day = self.begin_reconcile().fetch(remote).await?;
        Ok(self.finish_reconcile(remote_day))
    }
}
