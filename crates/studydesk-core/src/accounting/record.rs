use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::day::DayKey;
use crate::error::ValidationError;
use crate::timer::TimerMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Continuous,
    Interval,
}

impl From<TimerMode> for SessionType {
    fn from(mode: TimerMode) -> Self {
        match mode {
            TimerMode::Continuous => SessionType::Continuous,
            TimerMode::Interval => SessionType::Interval,
        }
    }
}

/// One finished block of study. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub duration_minutes: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub session_type: SessionType,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record, rejecting sessions under one minute.
    pub fn new(
        user_id: &str,
        subject: &str,
        duration_minutes: u64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        session_type: SessionType,
    ) -> Result<Self, ValidationError> {
        if end_time < start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: start_time,
                end: end_time,
            });
        }
        if duration_minutes < 1 {
            let seconds = (end_time - start_time).num_seconds().max(0) as u64;
            return Err(ValidationError::SessionTooShort { seconds });
        }
        if subject.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "subject".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            subject: subject.to_string(),
            duration_minutes,
            start_time,
            end_time,
            session_type,
            created_at: end_time,
        })
    }

    /// Local day the session started on.
    pub fn day(&self) -> DayKey {
        DayKey::from_epoch_ms(self.start_time.timestamp_millis().max(0) as u64)
    }
}
