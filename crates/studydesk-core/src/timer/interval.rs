use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Stopwatch-style count-up with no fixed duration.
    #[default]
    Continuous,
    /// Alternating fixed-length Work/Break phases.
    Interval,
}

impl std::str::FromStr for TimerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continuous" => Ok(TimerMode::Continuous),
            "interval" | "pomodoro" => Ok(TimerMode::Interval),
            other => Err(format!("unknown timer mode '{other}'")),
        }
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimerMode::Continuous => f.write_str("continuous"),
            TimerMode::Interval => f.write_str("interval"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Work,
    Break,
}

/// Phase lengths for Interval mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalConfig {
    pub work_secs: u64,
    pub break_secs: u64,
    pub long_break_secs: u64,
    pub sessions_before_long_break: u32,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            break_secs: 5 * 60,
            long_break_secs: 15 * 60,
            sessions_before_long_break: 4,
        }
    }
}

impl IntervalConfig {
    pub fn from_minutes(work: u64, brk: u64, long_break: u64, sessions_before_long_break: u32) -> Self {
        Self {
            work_secs: work.saturating_mul(60),
            break_secs: brk.saturating_mul(60),
            long_break_secs: long_break.saturating_mul(60),
            sessions_before_long_break,
        }
    }

    /// Whether the break following the `completed`-th work block is long.
    pub fn is_long_break_due(&self, completed: u32) -> bool {
        self.sessions_before_long_break > 0 && completed % self.sessions_before_long_break == 0
    }

    pub fn work_minutes(&self) -> u64 {
        self.work_secs / 60
    }
}

/// A Work/Break flip performed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: Phase,
    pub to: Phase,
    /// Length of the work block this flip ended or began.
    pub work_secs: u64,
    pub long_break: bool,
    pub completed_intervals: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_break_every_n() {
        let cfg = IntervalConfig::default();
        assert!(!cfg.is_long_break_due(1));
        assert!(!cfg.is_long_break_due(3));
        assert!(cfg.is_long_break_due(4));
        assert!(cfg.is_long_break_due(8));
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Interval".parse::<TimerMode>().unwrap(), TimerMode::Interval);
        assert_eq!("continuous".parse::<TimerMode>().unwrap(), TimerMode::Continuous);
        assert!("stopwatch".parse::<TimerMode>().is_err());
    }
}
