//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads and does not read the clock itself - every command takes
//! the current time in epoch milliseconds, and the caller is responsible for
//! calling `tick()` periodically.
//!
//! Elapsed time is always derived from the difference between the current
//! timestamp and the previous tick, never from the number of tick calls, so a
//! delayed or suspended callback still produces the correct total when it
//! eventually fires.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Stopped -> (reset) Idle
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerMode::Continuous, IntervalConfig::default());
//! engine.start(false, now_ms);
//! // In a loop:
//! let outcome = engine.tick(now_ms);
//! ```

use serde::{Deserialize, Serialize};

use super::interval::{IntervalConfig, Phase, PhaseTransition, TimerMode};

/// Default minimum gap between two phase transitions.
pub const DEFAULT_PHASE_DEBOUNCE_MS: u64 = 1_500;

/// Values captured by `pause()` and restored by `start(true)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedSnapshot {
    pub seconds: u64,
    pub phase: Phase,
    pub completed_intervals: u32,
    pub total_elapsed_secs: u64,
}

/// What a single `tick()` observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub mode: TimerMode,
    /// Phase the elapsed seconds were spent in.
    pub phase: Phase,
    /// Whole seconds consumed by this tick.
    pub elapsed_secs: u64,
    pub transition: Option<PhaseTransition>,
}

impl TickOutcome {
    fn empty(mode: TimerMode, phase: Phase) -> Self {
        Self {
            mode,
            phase,
            elapsed_secs: 0,
            transition: None,
        }
    }

    /// Seconds that count as study time (Continuous mode or Work phase).
    pub fn study_secs(&self) -> u64 {
        match (self.mode, self.phase) {
            (TimerMode::Interval, Phase::Break) => 0,
            _ => self.elapsed_secs,
        }
    }
}

/// Events produced by timer commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Started {
        mode: TimerMode,
        phase: Phase,
        seconds: u64,
        resumed: bool,
    },
    Paused {
        seconds: u64,
        flushed: TickOutcome,
    },
    Stopped {
        mode: TimerMode,
        total_elapsed_secs: u64,
        flushed: Option<TickOutcome>,
    },
    Reset {
        mode: TimerMode,
    },
    ModeSwitched {
        from: TimerMode,
        to: TimerMode,
    },
}

/// Serializable view of the timer for hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub running: bool,
    pub phase: Phase,
    pub remaining_or_elapsed_seconds: u64,
    pub total_elapsed_seconds: u64,
    pub completed_intervals: u32,
    pub paused: bool,
    pub interval: IntervalConfig,
}

/// Core timer engine.
///
/// Operates on wall-clock deltas -- no internal thread.
/// `seconds` holds elapsed time in Continuous mode and remaining time in
/// Interval mode. `anchor_ms` is `Some` exactly while `running` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerEngine {
    mode: TimerMode,
    running: bool,
    phase: Phase,
    seconds: u64,
    total_elapsed_secs: u64,
    /// Wall-clock time of the last start/resume.
    #[serde(default)]
    anchor_ms: Option<u64>,
    /// Timestamp the previous tick was measured against.
    #[serde(default)]
    last_tick_ms: Option<u64>,
    /// Sub-second remainder not yet converted into whole seconds.
    #[serde(default)]
    carry_ms: u64,
    #[serde(default)]
    completed_intervals: u32,
    interval: IntervalConfig,
    /// Length of the current work block, fixed when the block starts.
    #[serde(default)]
    block_secs: u64,
    #[serde(default)]
    last_transition_ms: Option<u64>,
    #[serde(default = "default_debounce")]
    debounce_ms: u64,
    /// Set by `stop()`; the final value stays readable until `reset()`.
    #[serde(default)]
    finished: bool,
    /// Persisted separately under its own cache key.
    #[serde(skip)]
    paused: Option<PausedSnapshot>,
    #[serde(skip, default = "default_visible")]
    visible: bool,
}

fn default_debounce() -> u64 {
    DEFAULT_PHASE_DEBOUNCE_MS
}

fn default_visible() -> bool {
    true
}

impl TimerEngine {
    /// Create an idle engine for `mode`.
    pub fn new(mode: TimerMode, interval: IntervalConfig) -> Self {
        Self {
            mode,
            running: false,
            phase: Phase::Work,
            seconds: initial_seconds(mode, &interval),
            total_elapsed_secs: 0,
            anchor_ms: None,
            last_tick_ms: None,
            carry_ms: 0,
            completed_intervals: 0,
            interval,
            block_secs: interval.work_secs,
            last_transition_ms: None,
            debounce_ms: DEFAULT_PHASE_DEBOUNCE_MS,
            finished: false,
            paused: None,
            visible: true,
        }
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Elapsed seconds in Continuous mode, remaining seconds in Interval mode.
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn total_elapsed_secs(&self) -> u64 {
        self.total_elapsed_secs
    }

    pub fn anchor_ms(&self) -> Option<u64> {
        self.anchor_ms
    }

    pub fn completed_intervals(&self) -> u32 {
        self.completed_intervals
    }

    pub fn interval(&self) -> &IntervalConfig {
        &self.interval
    }

    pub fn paused_snapshot(&self) -> Option<&PausedSnapshot> {
        self.paused.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            running: self.running,
            phase: self.phase,
            remaining_or_elapsed_seconds: self.seconds,
            total_elapsed_seconds: self.total_elapsed_secs,
            completed_intervals: self.completed_intervals,
            paused: self.paused.is_some(),
            interval: self.interval,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the timer. With `resume`, continue from the paused snapshot
    /// instead of beginning a fresh session. No-op while running.
    pub fn start(&mut self, resume: bool, now_ms: u64) -> Option<TimerEvent> {
        if self.running {
            return None;
        }
        let restored = if resume { self.paused.take() } else { None };
        let resumed = match restored {
            Some(snap) => {
                self.seconds = snap.seconds;
                self.phase = snap.phase;
                self.completed_intervals = snap.completed_intervals;
                self.total_elapsed_secs = snap.total_elapsed_secs;
                true
            }
            None => {
                self.reinitialize();
                false
            }
        };
        self.finished = false;
        self.running = true;
        self.anchor_ms = Some(now_ms);
        self.last_tick_ms = Some(now_ms);
        self.carry_ms = 0;
        Some(TimerEvent::Started {
            mode: self.mode,
            phase: self.phase,
            seconds: self.seconds,
            resumed,
        })
    }

    /// Pause, flushing elapsed time first. No-op unless running.
    pub fn pause(&mut self, now_ms: u64) -> Option<TimerEvent> {
        if !self.running {
            return None;
        }
        let flushed = self.tick(now_ms);
        self.paused = Some(PausedSnapshot {
            seconds: self.seconds,
            phase: self.phase,
            completed_intervals: self.completed_intervals,
            total_elapsed_secs: self.total_elapsed_secs,
        });
        self.halt();
        Some(TimerEvent::Paused {
            seconds: self.seconds,
            flushed,
        })
    }

    /// End the session. The final elapsed value stays readable until
    /// `reset()`. Stopping twice, or stopping an untouched timer, is a no-op.
    pub fn stop(&mut self, now_ms: u64) -> Option<TimerEvent> {
        if self.finished || (!self.running && self.paused.is_none()) {
            return None;
        }
        let flushed = self.running.then(|| self.tick(now_ms));
        self.paused = None;
        self.halt();
        self.finished = true;
        Some(TimerEvent::Stopped {
            mode: self.mode,
            total_elapsed_secs: self.total_elapsed_secs,
            flushed,
        })
    }

    /// Return to the mode's defaults. Ignored while the host is not visible
    /// so a background instance cannot wipe state a foreground one owns.
    pub fn reset(&mut self) -> Option<TimerEvent> {
        if !self.visible {
            return None;
        }
        self.reinitialize();
        self.halt();
        self.paused = None;
        self.finished = false;
        Some(TimerEvent::Reset { mode: self.mode })
    }

    /// Switch modes. Always stops and zeroes; nothing carries across modes.
    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<TimerEvent> {
        let from = self.mode;
        self.mode = mode;
        self.halt();
        self.paused = None;
        self.finished = false;
        self.reinitialize();
        Some(TimerEvent::ModeSwitched { from, to: mode })
    }

    /// Replace the interval durations. Applied immediately when idle,
    /// otherwise from the next phase on.
    pub fn set_interval_config(&mut self, interval: IntervalConfig) {
        self.interval = interval;
        if !self.running && self.paused.is_none() && self.total_elapsed_secs == 0 {
            self.reinitialize();
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Measure the next tick from `now_ms`, dropping any time accrued
    /// since the previous tick.
    pub fn reanchor(&mut self, now_ms: u64) {
        if self.running {
            self.last_tick_ms = Some(now_ms);
            self.carry_ms = 0;
        }
    }

    /// Call periodically. Consumes the wall-clock time since the previous
    /// tick and performs an Interval phase transition when the current
    /// phase runs out.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut outcome = TickOutcome::empty(self.mode, self.phase);
        if !self.running {
            return outcome;
        }

        let last = self.last_tick_ms.unwrap_or(now_ms);
        let delta_ms = now_ms.saturating_sub(last) + self.carry_ms;
        let whole = delta_ms / 1000;
        self.carry_ms = delta_ms % 1000;
        self.last_tick_ms = Some(now_ms);

        match self.mode {
            TimerMode::Continuous => {
                self.seconds = self.seconds.saturating_add(whole);
                self.total_elapsed_secs = self.total_elapsed_secs.saturating_add(whole);
                outcome.elapsed_secs = whole;
            }
            TimerMode::Interval => {
                let step = whole.min(self.seconds);
                if step < whole {
                    // Overshoot past the phase end is dropped.
                    self.carry_ms = 0;
                }
                self.seconds -= step;
                self.total_elapsed_secs = self.total_elapsed_secs.saturating_add(step);
                outcome.elapsed_secs = step;
                if self.seconds == 0 {
                    outcome.transition = self.complete_phase(now_ms);
                }
            }
        }
        outcome
    }

    /// Flip Work/Break once the current phase has reached zero. Calls
    /// arriving within the debounce window of the previous transition are
    /// ignored.
    pub fn complete_phase(&mut self, now_ms: u64) -> Option<PhaseTransition> {
        if self.mode != TimerMode::Interval || !self.running || self.seconds != 0 {
            return None;
        }
        if let Some(prev) = self.last_transition_ms {
            if now_ms.saturating_sub(prev) < self.debounce_ms {
                return None;
            }
        }
        self.last_transition_ms = Some(now_ms);

        let transition = match self.phase {
            Phase::Work => {
                self.completed_intervals = self.completed_intervals.saturating_add(1);
                let long_break = self.interval.is_long_break_due(self.completed_intervals);
                self.phase = Phase::Break;
                self.seconds = if long_break {
                    self.interval.long_break_secs
                } else {
                    self.interval.break_secs
                };
                PhaseTransition {
                    from: Phase::Work,
                    to: Phase::Break,
                    work_secs: self.block_secs,
                    long_break,
                    completed_intervals: self.completed_intervals,
                }
            }
            Phase::Break => {
                self.phase = Phase::Work;
                self.seconds = self.interval.work_secs;
                self.block_secs = self.interval.work_secs;
                PhaseTransition {
                    from: Phase::Break,
                    to: Phase::Work,
                    work_secs: self.block_secs,
                    long_break: false,
                    completed_intervals: self.completed_intervals,
                }
            }
        };
        Some(transition)
    }

    /// Restore the paused snapshot loaded from the cache.
    pub fn restore_paused(&mut self, snapshot: Option<PausedSnapshot>) {
        if !self.running {
            self.paused = snapshot;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn halt(&mut self) {
        self.running = false;
        self.anchor_ms = None;
        self.last_tick_ms = None;
        self.carry_ms = 0;
    }

    fn reinitialize(&mut self) {
        self.phase = Phase::Work;
        self.seconds = initial_seconds(self.mode, &self.interval);
        self.block_secs = self.interval.work_secs;
        self.total_elapsed_secs = 0;
        self.completed_intervals = 0;
        self.last_transition_ms = None;
    }

    /// Repair a deserialized engine whose running flag and anchor disagree.
    pub(crate) fn normalize(&mut self) {
        if self.block_secs == 0 {
            self.block_secs = self.interval.work_secs;
        }
        match (self.running, self.anchor_ms) {
            (true, None) => self.halt(),
            (false, Some(_)) => self.halt(),
            (true, Some(anchor)) if self.last_tick_ms.is_none() => {
                self.last_tick_ms = Some(anchor);
            }
            _ => {}
        }
    }
}

fn initial_seconds(mode: TimerMode, interval: &IntervalConfig) -> u64 {
    match mode {
        TimerMode::Continuous => 0,
        TimerMode::Interval => interval.work_secs,
    }
}
