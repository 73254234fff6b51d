//! Session accounting: turns timer time into per-subject day totals and
//! append-only session records.

mod day;
mod ledger;
mod profile;
mod progress;
mod record;

pub use day::{DayKey, DayPolicy, DayRoll};
pub use ledger::{SessionAccountant, StopOutcome};
pub use profile::{ProfileDelta, UserProfile};
pub use progress::SubjectProgress;
pub use record::{SessionRecord, SessionType};
