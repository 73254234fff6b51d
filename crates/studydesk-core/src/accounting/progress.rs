use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::day::{DayKey, DayPolicy, DayRoll};

/// Per-subject study minutes for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub date: DayKey,
    pub minutes_by_subject: BTreeMap<String, u64>,
    /// Seconds not yet promoted into a whole minute, per subject.
    #[serde(default)]
    pub pending_seconds: BTreeMap<String, u64>,
}

impl SubjectProgress {
    pub fn new(date: DayKey) -> Self {
        Self {
            date,
            minutes_by_subject: BTreeMap::new(),
            pending_seconds: BTreeMap::new(),
        }
    }

    /// A zeroed entry for every subject in `subjects`.
    pub fn with_subjects(date: DayKey, subjects: &[String]) -> Self {
        let mut progress = Self::new(date);
        for subject in subjects {
            progress.minutes_by_subject.insert(subject.clone(), 0);
        }
        progress
    }

    pub fn minutes(&self, subject: &str) -> u64 {
        self.minutes_by_subject.get(subject).copied().unwrap_or(0)
    }

    pub fn total_minutes(&self) -> u64 {
        self.minutes_by_subject.values().sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.minutes_by_subject.values().all(|m| *m == 0)
            && self.pending_seconds.values().all(|s| *s == 0)
    }

    /// Add study seconds; returns how many whole minutes were promoted.
    pub fn add_seconds(&mut self, subject: &str, seconds: u64) -> u64 {
        if seconds == 0 {
            return 0;
        }
        let pending = self.pending_seconds.entry(subject.to_string()).or_insert(0);
        *pending += seconds;
        let promoted = *pending / 60;
        *pending %= 60;
        if promoted > 0 {
            *self.minutes_by_subject.entry(subject.to_string()).or_insert(0) += promoted;
        }
        promoted
    }

    pub fn add_minutes(&mut self, subject: &str, minutes: u64) {
        if minutes > 0 {
            *self.minutes_by_subject.entry(subject.to_string()).or_insert(0) += minutes;
        }
    }

    /// Raise each subject to at least `minutes`, never lowering it.
    pub fn merge_max(&mut self, subject: &str, minutes: u64) {
        let entry = self.minutes_by_subject.entry(subject.to_string()).or_insert(0);
        *entry = (*entry).max(minutes);
    }

    /// Move the snapshot onto `today` according to `policy`.
    pub fn roll_to(&mut self, today: &DayKey, policy: DayPolicy) -> DayRoll {
        if &self.date == today {
            return DayRoll::SameDay;
        }
        let from = std::mem::replace(&mut self.date, today.clone());
        let keep = policy == DayPolicy::Conservative && !self.is_all_zero();
        if keep {
            DayRoll::Advanced {
                from,
                to: today.clone(),
            }
        } else {
            for minutes in self.minutes_by_subject.values_mut() {
                *minutes = 0;
            }
            self.pending_seconds.clear();
            DayRoll::Reset {
                from,
                to: today.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> DayKey {
        DayKey::parse(s).unwrap()
    }

    #[test]
    fn seconds_promote_into_minutes() {
        let mut p = SubjectProgress::new(day("2024-05-01"));
        assert_eq!(p.add_seconds("Physics", 59), 0);
        assert_eq!(p.minutes("Physics"), 0);
        assert_eq!(p.add_seconds("Physics", 1), 1);
        assert_eq!(p.add_seconds("Physics", 150), 2);
        assert_eq!(p.minutes("Physics"), 3);
        assert_eq!(p.pending_seconds["Physics"], 30);
    }

    #[test]
    fn conservative_keeps_nonzero_stale_totals() {
        let mut p = SubjectProgress::new(day("2024-05-01"));
        p.add_minutes("Physics", 45);
        let roll = p.roll_to(&day("2024-05-02"), DayPolicy::Conservative);
        assert!(matches!(roll, DayRoll::Advanced { .. }));
        assert_eq!(p.date, day("2024-05-02"));
        assert_eq!(p.minutes("Physics"), 45);
    }

    #[test]
    fn conservative_resets_all_zero_totals() {
        let mut p = SubjectProgress::with_subjects(day("2024-05-01"), &["Physics".into()]);
        let roll = p.roll_to(&day("2024-05-02"), DayPolicy::Conservative);
        assert!(matches!(roll, DayRoll::Reset { .. }));
        assert_eq!(p.minutes_by_subject.len(), 1);
    }

    #[test]
    fn strict_always_resets_on_new_day() {
        let mut p = SubjectProgress::new(day("2024-05-01"));
        p.add_minutes("Physics", 45);
        p.roll_to(&day("2024-05-02"), DayPolicy::Strict);
        assert_eq!(p.minutes("Physics"), 0);
    }

    #[test]
    fn same_day_is_untouched() {
        let mut p = SubjectProgress::new(day("2024-05-01"));
        p.add_minutes("Physics", 45);
        assert_eq!(p.roll_to(&day("2024-05-01"), DayPolicy::Strict), DayRoll::SameDay);
        assert_eq!(p.minutes("Physics"), 45);
    }
}
