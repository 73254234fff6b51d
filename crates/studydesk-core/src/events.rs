use serde::{Deserialize, Serialize};

use crate::accounting::{DayRoll, SessionRecord};
use crate::timer::{PhaseTransition, TimerEvent};

/// Every user-visible outcome of a tracker action produces an Event.
/// Hosts surface them (toasts, warnings); none of them is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Timer {
        event: TimerEvent,
    },
    SessionRecorded {
        record: SessionRecord,
    },
    /// Session under one minute; discarded.
    SessionTooShort {
        seconds: u64,
    },
    PhaseChanged {
        transition: PhaseTransition,
    },
    DayRolled {
        roll: DayRoll,
    },
    /// A write is waiting in the pending queue because the remote is offline.
    QueuedOffline {
        pending: usize,
    },
    /// The local cache rejected a write; state lives in memory only.
    CacheDegraded {
        message: String,
    },
}
