use clap::Subcommand;
use studydesk_core::Action;

use super::open_tracker;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Minutes per subject for today
    Today,
    /// Session records emitted today
    Sessions,
}

pub fn run(action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = open_tracker()?;
    // Credit any running time first.
    tracker.dispatch(Action::Tick);

    match action {
        ProgressAction::Today => {
            println!("{}", serde_json::to_string_pretty(tracker.progress())?);
        }
        ProgressAction::Sessions => {
            println!("{}", serde_json::to_string_pretty(tracker.records_today())?);
        }
    }
    Ok(())
}
