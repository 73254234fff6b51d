//! Core types for offline mutation sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounting::{ProfileDelta, SessionRecord};

/// Remote collection a document mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Sessions,
    Tasks,
    Events,
}

impl Collection {
    /// Path segment used by the document store.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Sessions => "sessions",
            Collection::Tasks => "tasks",
            Collection::Events => "events",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOp {
    Upsert,
    Delete,
}

/// A task or event change produced by the CRUD surfaces, carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMutation {
    pub id: String,
    pub op: MutationOp,
    #[serde(default)]
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// One queued write awaiting confirmation from the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingMutation {
    Session(SessionRecord),
    Task(DocumentMutation),
    Event(DocumentMutation),
    ProfileIncrement(ProfileDelta),
}

impl PendingMutation {
    /// Identity used to avoid queueing the same write twice.
    pub fn key(&self) -> String {
        match self {
            PendingMutation::Session(r) => format!("session:{}", r.id),
            PendingMutation::Task(m) => format!("task:{}:{}", m.id, m.updated_at.timestamp_millis()),
            PendingMutation::Event(m) => format!("event:{}:{}", m.id, m.updated_at.timestamp_millis()),
            PendingMutation::ProfileIncrement(d) => format!("profile:{}", d.session_id),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PendingMutation::Session(_) => "session",
            PendingMutation::Task(_) => "task",
            PendingMutation::Event(_) => "event",
            PendingMutation::ProfileIncrement(_) => "profile_increment",
        }
    }
}

/// Anything reconcilable by id and modification time.
pub trait Versioned {
    fn id(&self) -> &str;
    fn updated_at(&self) -> DateTime<Utc>;
}

impl Versioned for SessionRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Versioned for DocumentMutation {
    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Current sync status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Last successful drain.
    pub last_sync_at: Option<DateTime<Utc>>,
    /// Number of queued writes.
    pub pending_count: usize,
    pub online: bool,
}

/// Outcome of one `drain_pending` pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub written: usize,
    pub remaining: usize,
    /// Error that stopped the pass, if any.
    pub error: Option<String>,
}

impl DrainReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.remaining == 0
    }
}
