use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::record::SessionRecord;

/// The per-user profile document kept by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub study_times: BTreeMap<String, u64>,
    #[serde(default)]
    pub total_study_time: u64,
    #[serde(default)]
    pub display_name: String,
}

/// An incremental update to a profile's study totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDelta {
    /// Session that produced this increment; makes replays detectable.
    pub session_id: String,
    pub subject: String,
    pub minutes: u64,
}

impl ProfileDelta {
    pub fn for_record(record: &SessionRecord) -> Self {
        Self {
            session_id: record.id.clone(),
            subject: record.subject.clone(),
            minutes: record.duration_minutes,
        }
    }
}

impl UserProfile {
    pub fn apply(&mut self, delta: &ProfileDelta) {
        *self.study_times.entry(delta.subject.clone()).or_insert(0) += delta.minutes;
        self.total_study_time += delta.minutes;
    }
}
