//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Interval (work/break) durations
//! - Timer defaults and phase-transition debounce
//! - Remote document store endpoint and sync cadence
//! - Day-boundary policy for subject progress
//!
//! Configuration is stored at `~/.config/studydesk/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::accounting::DayPolicy;
use crate::error::ConfigError;
use crate::timer::{IntervalConfig, TimerMode, DEFAULT_PHASE_DEBOUNCE_MS};

/// Interval-mode durations, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalSection {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u64,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u64,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerSection {
    #[serde(default)]
    pub default_mode: TimerMode,
    #[serde(default = "default_debounce_ms")]
    pub phase_debounce_ms: u64,
    #[serde(default = "default_subject")]
    pub default_subject: String,
    /// Drop time spent in the background when the host returns to the
    /// foreground. Off by default: background time counts as study time.
    #[serde(default)]
    pub reanchor_on_foreground: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    /// Base URL of the document store. Unset means offline-only.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSection {
    #[serde(default = "default_day_check_interval")]
    pub day_check_interval_secs: u64,
    #[serde(default)]
    pub day_policy: DayPolicy,
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/studydesk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub interval: IntervalSection,
    #[serde(default)]
    pub timer: TimerSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub progress: ProgressSection,
}

// Default functions
fn default_work_minutes() -> u64 {
    25
}
fn default_break_minutes() -> u64 {
    5
}
fn default_long_break_minutes() -> u64 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_debounce_ms() -> u64 {
    DEFAULT_PHASE_DEBOUNCE_MS
}
fn default_subject() -> String {
    "General".into()
}
fn default_user_id() -> String {
    "local".into()
}
fn default_sync_interval() -> u64 {
    60
}
fn default_timeout() -> u64 {
    10
}
fn default_day_check_interval() -> u64 {
    60
}
fn default_subjects() -> Vec<String> {
    ["Physics", "Chemistry", "Mathematics", "Biology"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for IntervalSection {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl Default for TimerSection {
    fn default() -> Self {
        Self {
            default_mode: TimerMode::Continuous,
            phase_debounce_ms: default_debounce_ms(),
            default_subject: default_subject(),
            reanchor_on_foreground: false,
        }
    }
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            endpoint: None,
            user_id: default_user_id(),
            display_name: String::new(),
            interval_secs: default_sync_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for ProgressSection {
    fn default() -> Self {
        Self {
            day_check_interval_secs: default_day_check_interval(),
            day_policy: DayPolicy::default(),
            subjects: default_subjects(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval: IntervalSection::default(),
            timer: TimerSection::default(),
            sync: SyncSection::default(),
            progress: ProgressSection::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location, `<data_dir>/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or fails
    /// validation, or if the default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("interval.work_minutes", self.interval.work_minutes),
            ("interval.break_minutes", self.interval.break_minutes),
            ("interval.long_break_minutes", self.interval.long_break_minutes),
            (
                "interval.sessions_before_long_break",
                u64::from(self.interval.sessions_before_long_break),
            ),
            ("sync.interval_secs", self.sync.interval_secs),
            ("progress.day_check_interval_secs", self.progress.day_check_interval_secs),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be at least 1".to_string(),
                });
            }
        }
        if self.timer.default_subject.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_subject".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn interval_config(&self) -> IntervalConfig {
        IntervalConfig::from_minutes(
            self.interval.work_minutes,
            self.interval.break_minutes,
            self.interval.long_break_minutes,
            self.interval.sessions_before_long_break,
        )
    }
}
