//! Wall-clock sources.
//!
//! Everything time-dependent in the core reads time through [`Clock`] so the
//! timer and day-boundary logic can be driven deterministically in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::accounting::DayKey;

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// The local calendar day that `now_ms()` falls on.
    fn today(&self) -> DayKey {
        DayKey::from_epoch_ms(self.now_ms())
    }

    fn now_utc(&self) -> DateTime<Utc> {
        to_utc(self.now_ms())
    }
}

/// The real system clock, local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// A hand-driven clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(epoch_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(epoch_ms)),
        }
    }

    /// A clock set to local noon on `date`, away from any day edge.
    pub fn at_local_noon(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        let ms = Local
            .from_local_datetime(&noon)
            .earliest()
            .map(|dt| dt.timestamp_millis().max(0) as u64)
            .unwrap_or_default();
        Self::new(ms)
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs.saturating_mul(1000));
    }

    pub fn set_ms(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub(crate) fn to_utc(epoch_ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms as i64).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance_secs(2);
        assert_eq!(other.now_ms(), 3_000);
    }

    #[test]
    fn local_noon_maps_back_to_same_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let clock = ManualClock::at_local_noon(date);
        assert_eq!(clock.today().as_str(), "2024-03-09");
    }
}
