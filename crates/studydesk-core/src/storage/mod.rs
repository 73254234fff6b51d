mod cache;
mod config;
pub mod keys;

pub use cache::{load_json, store_json, LocalCache, MemoryCache, SqliteCache};
pub use config::{Config, IntervalSection, ProgressSection, SyncSection, TimerSection};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/studydesk[-dev]/` based on STUDYDESK_ENV.
///
/// Set STUDYDESK_ENV=dev to use development data directory.
/// STUDYDESK_DATA_DIR overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDYDESK_DATA_DIR") {
        Some(explicit) => PathBuf::from(explicit),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYDESK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studydesk-dev")
            } else {
                base_dir.join("studydesk")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
