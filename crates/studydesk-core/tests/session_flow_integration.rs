//! Integration tests for the full session flow.
//!
//! These tests drive a tracker backed by a real SQLite cache file through
//! study sessions, restarts and an offline period, then drain to a remote.

use chrono::NaiveDate;
use studydesk_core::storage::keys;
use studydesk_core::sync::PendingMutation;
use studydesk_core::{
    Action, Config, Event, LocalCache, ManualClock, MemoryRemote, SqliteCache, StudyTracker, TimerMode,
};
use tempfile::TempDir;

fn clock() -> ManualClock {
    ManualClock::at_local_noon(NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
}

fn open(dir: &TempDir, clock: &ManualClock) -> StudyTracker<SqliteCache, ManualClock> {
    let cache = SqliteCache::open(&dir.path().join("studydesk.db")).unwrap();
    StudyTracker::load(cache, clock.clone(), Config::default())
}

#[test]
fn test_progress_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut tracker = open(&dir, &clock);
    tracker.dispatch(Action::SetSubject("Chemistry".into()));
    tracker.dispatch(Action::Start { resume: false });
    clock.advance_secs(20 * 60);
    tracker.dispatch(Action::Stop);
    assert_eq!(tracker.progress().minutes("Chemistry"), 20);
    drop(tracker);

    let tracker = open(&dir, &clock);
    assert_eq!(tracker.progress().minutes("Chemistry"), 20);
    assert_eq!(tracker.records_today().len(), 1);
    assert_eq!(tracker.queue().len(), 2);
    assert_eq!(tracker.profile().study_times.get("Chemistry"), Some(&20));
}

#[test]
fn test_interval_day_across_restarts() {
    let dir = TempDir::new().unwrap();
    let clock = clock();

    let mut tracker = open(&dir, &clock);
    tracker.dispatch(Action::SetSubject("Mathematics".into()));
    tracker.dispatch(Action::SwitchMode(TimerMode::Interval));
    tracker.dispatch(Action::Start { resume: false });

    // Host goes away mid-block and comes back after the block ended.
    clock.advance_secs(10 * 60);
    tracker.dispatch(Action::BeforeTerminate);
    drop(tracker);

    clock.advance_secs(20 * 60);
    let mut tracker = open(&dir, &clock);
    let events = tracker.dispatch(Action::Tick);
    let recorded: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::SessionRecorded { .. }))
        .collect();
    assert_eq!(recorded.len(), 1);
    assert_eq!(tracker.progress().minutes("Mathematics"), 25);
}

#[test]
fn test_corrupt_blob_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    {
        let mut cache = SqliteCache::open(&dir.path().join("studydesk.db")).unwrap();
        cache.set(keys::TIMER_STATE, "{not json").unwrap();
        cache.set(keys::PENDING_QUEUE, "42").unwrap();
    }

    let tracker = open(&dir, &clock);
    assert!(!tracker.engine().is_running());
    assert!(tracker.queue().is_empty());
    assert_eq!(tracker.subject(), "General");
}

#[tokio::test]
async fn test_offline_day_then_drain() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let remote = MemoryRemote::new();
    remote.set_online(false);

    let mut tracker = open(&dir, &clock);
    for subject in ["Physics", "Biology", "Physics"] {
        tracker.dispatch(Action::SetSubject(subject.into()));
        tracker.dispatch(Action::Start { resume: false });
        clock.advance_secs(15 * 60);
        tracker.dispatch(Action::Stop);
    }

    let report = tracker.sync(&remote).await;
    assert_eq!(report.written, 0);
    assert_eq!(report.remaining, 6);
    drop(tracker);

    // Queue order survives a restart.
    let mut tracker = open(&dir, &clock);
    let kinds: Vec<_> = tracker.queue().iter().map(PendingMutation::kind).collect();
    assert_eq!(
        kinds,
        ["session", "profile_increment", "session", "profile_increment", "session", "profile_increment"]
    );

    remote.set_online(true);
    let report = tracker.on_reconnect(&remote).await;
    assert!(report.is_complete());
    assert_eq!(report.written, 6);

    let profile = remote.profile("local").unwrap();
    assert_eq!(profile.study_times.get("Physics"), Some(&30));
    assert_eq!(profile.study_times.get("Biology"), Some(&15));
    assert_eq!(profile.total_study_time, 45);

    // A second drain sends nothing.
    let report = tracker.sync(&remote).await;
    assert_eq!(report.written, 0);
    assert_eq!(remote.write_count(), 6);
}
