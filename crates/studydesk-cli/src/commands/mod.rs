pub mod config;
pub mod progress;
pub mod sync;
pub mod timer;

use studydesk_core::{Config, CoreError, SqliteCache, StudyTracker, SystemClock};

/// Every invocation is one host session: rehydrate from the data
/// directory, apply the command, save on the way out.
pub fn open_tracker() -> Result<StudyTracker<SqliteCache, SystemClock>, CoreError> {
    let config = Config::load()?;
    let cache = SqliteCache::open_default()?;
    Ok(StudyTracker::load(cache, SystemClock, config))
}

/// Print events as one JSON document per line.
pub fn print_events(events: &[studydesk_core::Event]) -> Result<(), serde_json::Error> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
