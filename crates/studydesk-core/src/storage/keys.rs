//! Local cache keys shared by every component that persists state.

/// Today's `{date, minutesBySubject}` blob.
pub const PROGRESS_TODAY: &str = "progress.today";
/// Last calendar day the app was used on.
pub const LAST_USED_DATE: &str = "progress.last_date";
/// Timer state (mode, running, seconds, phase, settings).
pub const TIMER_STATE: &str = "timer.state";
/// Snapshot taken by `pause()` for a later resume.
pub const TIMER_PAUSED: &str = "timer.paused";
/// Subject and start time of the session in progress.
pub const SESSION_CURRENT: &str = "session.current";
/// Pending offline mutations, oldest first.
pub const PENDING_QUEUE: &str = "sync.pending";
/// Local mirror of the remote profile document.
pub const PROFILE_LOCAL: &str = "profile.local";
/// Session records emitted today, kept for reconciliation.
pub const SESSIONS_TODAY: &str = "sessions.today";
/// Time of the last drain that finished without error.
pub const LAST_SYNC: &str = "sync.last_success";
