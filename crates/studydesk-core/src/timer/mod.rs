mod engine;
mod interval;

pub use engine::{
    PausedSnapshot, TickOutcome, TimerEngine, TimerEvent, TimerSnapshot,
    DEFAULT_PHASE_DEBOUNCE_MS,
};
pub use interval::{IntervalConfig, Phase, PhaseTransition, TimerMode};
