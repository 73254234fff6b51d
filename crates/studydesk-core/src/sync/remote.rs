//! Remote document store contract.
//!
//! The core never talks to a backend SDK directly; everything goes through
//! [`RemoteStore`]. Each call either confirms the write or fails, and a
//! failure leaves the caller free to retry later.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::accounting::{DayKey, ProfileDelta, SessionRecord, UserProfile};
use crate::error::RemoteError;
use crate::sync::types::{Collection, DocumentMutation, MutationOp};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Append a session record. Writing the same id twice is harmless.
    async fn put_session(&self, user_id: &str, record: &SessionRecord) -> Result<(), RemoteError>;

    /// Apply a task or event change.
    async fn apply_mutation(
        &self,
        user_id: &str,
        collection: Collection,
        mutation: &DocumentMutation,
    ) -> Result<(), RemoteError>;

    /// Add a session's minutes to the profile totals.
    async fn increment_profile(&self, user_id: &str, delta: &ProfileDelta) -> Result<(), RemoteError>;

    /// Session records that started on `day`.
    async fn sessions_for_day(&self, user_id: &str, day: &DayKey) -> Result<Vec<SessionRecord>, RemoteError>;

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RemoteError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    online: bool,
    succeed_before_failure: usize,
    fail_next_writes: usize,
    writes: usize,
    log: Vec<String>,
    sessions: BTreeMap<String, SessionRecord>,
    documents: HashMap<(Collection, String), DocumentMutation>,
    profiles: HashMap<String, UserProfile>,
    applied_increments: HashSet<String>,
}

/// In-process document store with failure injection.
#[derive(Debug)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                online: true,
                ..MemoryState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    /// Make the next `n` write attempts fail.
    pub fn fail_next_writes(&self, n: usize) {
        self.fail_after(0, n);
    }

    /// Let `successes` writes through, then fail the following `failures`.
    pub fn fail_after(&self, successes: usize, failures: usize) {
        let mut state = self.lock();
        state.succeed_before_failure = successes;
        state.fail_next_writes = failures;
    }

    /// Confirmed writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Confirmed writes in arrival order, as `kind:id`.
    pub fn write_log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn sessions(&self) -> Vec<SessionRecord> {
        self.lock().sessions.values().cloned().collect()
    }

    pub fn document(&self, collection: Collection, id: &str) -> Option<DocumentMutation> {
        self.lock().documents.get(&(collection, id.to_string())).cloned()
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.lock().profiles.get(user_id).cloned()
    }

    pub fn insert_session(&self, record: SessionRecord) {
        self.lock().sessions.insert(record.id.clone(), record);
    }

    fn begin_write(state: &mut MemoryState) -> Result<(), RemoteError> {
        if !state.online {
            return Err(RemoteError::Unavailable);
        }
        if state.fail_next_writes > 0 && state.succeed_before_failure > 0 {
            state.succeed_before_failure -= 1;
        } else if state.fail_next_writes > 0 {
            state.fail_next_writes -= 1;
            return Err(RemoteError::Rejected {
                status: 503,
                message: "injected failure".to_string(),
            });
        }
        state.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn put_session(&self, _user_id: &str, record: &SessionRecord) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::begin_write(&mut state)?;
        state.log.push(format!("session:{}", record.id));
        state.sessions.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn apply_mutation(
        &self,
        _user_id: &str,
        collection: Collection,
        mutation: &DocumentMutation,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::begin_write(&mut state)?;
        state.log.push(format!("{}:{}", collection.path(), mutation.id));
        let key = (collection, mutation.id.clone());
        match mutation.op {
            MutationOp::Upsert => {
                let newer = state
                    .documents
                    .get(&key)
                    .map_or(true, |existing| mutation.updated_at >= existing.updated_at);
                if newer {
                    state.documents.insert(key, mutation.clone());
                }
            }
            MutationOp::Delete => {
                state.documents.remove(&key);
            }
        }
        Ok(())
    }

    async fn increment_profile(&self, user_id: &str, delta: &ProfileDelta) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::begin_write(&mut state)?;
        state.log.push(format!("profile:{}", delta.session_id));
        if state.applied_increments.insert(delta.session_id.clone()) {
            state.profiles.entry(user_id.to_string()).or_default().apply(delta);
        }
        Ok(())
    }

    async fn sessions_for_day(&self, user_id: &str, day: &DayKey) -> Result<Vec<SessionRecord>, RemoteError> {
        let state = self.lock();
        if !state.online {
            return Err(RemoteError::Unavailable);
        }
        Ok(state
            .sessions
            .values()
            .filter(|r| r.user_id == user_id && &r.day() == day)
            .cloned()
            .collect())
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, RemoteError> {
        let state = self.lock();
        if !state.online {
            return Err(RemoteError::Unavailable);
        }
        Ok(state.profiles.get(user_id).cloned())
    }
}
