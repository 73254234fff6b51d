//! # Studydesk Core Library
//!
//! This library provides the core logic for Studydesk, a study timer that
//! keeps per-subject study time and syncs finished sessions to a remote
//! document store. The `studydesk` CLI and any GUI host are thin layers over
//! the same [`StudyTracker`].
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Accounting**: Per-day subject minutes, session records, day rollover
//! - **Storage**: SQLite key/value cache and TOML-based configuration
//! - **Sync**: Pending-write queue, last-write-wins reconciliation, remote store
//!
//! ## Key Components
//!
//! - [`StudyTracker`]: The single owned store hosts dispatch [`Action`]s to
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionAccountant`]: Turns elapsed time into minutes and records
//! - [`RemoteStore`]: Trait for the remote document store

pub mod accounting;
pub mod clock;
pub mod error;
pub mod events;
pub mod storage;
pub mod sync;
pub mod timer;
pub mod tracker;

pub use accounting::{
    DayKey, DayPolicy, DayRoll, ProfileDelta, SessionAccountant, SessionRecord, SessionType, StopOutcome,
    SubjectProgress, UserProfile,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, ConfigError, CoreError, RemoteError, ValidationError};
pub use events::Event;
pub use storage::{Config, LocalCache, MemoryCache, SqliteCache};
pub use sync::{DrainReport, HttpRemoteStore, MemoryRemote, PendingQueue, RemoteStore, SyncStatus};
pub use timer::{IntervalConfig, Phase, TimerEngine, TimerEvent, TimerMode, TimerSnapshot};
pub use tracker::{Action, StudyTracker, TrackerSnapshot};
