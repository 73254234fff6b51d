use std::io::Write;

use clap::Subcommand;
use studydesk_core::{Action, Clock, LocalCache, StudyTracker, TimerMode};

use super::{open_tracker, print_events};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session (or resume a paused one with --resume)
    Start {
        /// Continue from the paused snapshot
        #[arg(long)]
        resume: bool,
        /// Subject to credit study time to
        #[arg(long)]
        subject: Option<String>,
    },
    /// Pause, keeping elapsed time for --resume
    Pause,
    /// End the session and record it
    Stop,
    /// Return to the mode's defaults
    Reset,
    /// Switch between continuous and interval mode
    Mode {
        /// continuous | interval
        mode: TimerMode,
    },
    /// Print current timer state as JSON
    Status,
    /// Consume elapsed wall-clock time
    Tick,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = open_tracker()?;

    let mut events = Vec::new();
    match action {
        TimerAction::Start { resume, subject } => {
            if let Some(subject) = subject {
                events.extend(tracker.dispatch(Action::SetSubject(subject)));
            }
            events.extend(tracker.dispatch(Action::Start { resume }));
        }
        TimerAction::Pause => events.extend(tracker.dispatch(Action::Pause)),
        TimerAction::Stop => events.extend(tracker.dispatch(Action::Stop)),
        TimerAction::Reset => events.extend(tracker.dispatch(Action::Reset)),
        TimerAction::Mode { mode } => events.extend(tracker.dispatch(Action::SwitchMode(mode))),
        TimerAction::Status => return write_status(&mut tracker, &mut std::io::stdout().lock()),
        TimerAction::Tick => events.extend(tracker.dispatch(Action::Tick)),
    }

    print_events(&events)?;
    Ok(())
}

/// Tick, then write the snapshot as the only document on `out`. Events the
/// tick produced go to the log.
fn write_status<C: LocalCache, K: Clock>(
    tracker: &mut StudyTracker<C, K>,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error>> {
    for event in tracker.dispatch(Action::Tick) {
        tracing::info!(event = %serde_json::to_string(&event)?, "status tick");
    }
    writeln!(out, "{}", serde_json::to_string_pretty(&tracker.snapshot())?)?;
    Ok(())
}
