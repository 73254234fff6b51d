use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Canonical `YYYY-MM-DD` key for a local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// The local day containing the given instant.
    pub fn from_epoch_ms(epoch_ms: u64) -> Self {
        let date = Local
            .timestamp_millis_opt(epoch_ms as i64)
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_default();
        Self::from_date(date)
    }

    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(Self::from_date)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }
}

impl std::fmt::Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What to do with progress stored under a day-key that is no longer today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayPolicy {
    /// Reset only when the stale totals are all zero; otherwise move the
    /// key forward and keep the minutes.
    #[default]
    Conservative,
    /// Any stale key resets the totals.
    Strict,
}

/// Result of a day-boundary check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayRoll {
    SameDay,
    /// Totals zeroed for the new day.
    Reset { from: DayKey, to: DayKey },
    /// Key moved forward, totals kept.
    Advanced { from: DayKey, to: DayKey },
}

impl DayRoll {
    pub fn changed_day(&self) -> bool {
        !matches!(self, DayRoll::SameDay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_and_rejects() {
        assert_eq!(DayKey::parse("2024-01-05").unwrap().as_str(), "2024-01-05");
        assert!(DayKey::parse("2024-13-01").is_none());
        assert!(DayKey::parse("yesterday").is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = DayKey::parse("2024-06-30").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-06-30\"");
    }
}
