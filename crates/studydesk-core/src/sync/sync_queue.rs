//! FIFO queue of writes waiting for the remote store.
//!
//! The queue mirrors itself into the local cache under `sync.pending`; an
//! entry leaves the queue only after the remote confirms the write.

use std::collections::VecDeque;

use crate::error::CacheError;
use crate::storage::{keys, load_json, store_json, LocalCache};
use crate::sync::types::PendingMutation;

#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    entries: VecDeque<PendingMutation>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the cache; a missing or corrupt blob yields an empty queue.
    pub fn load<C: LocalCache + ?Sized>(cache: &C) -> Self {
        let entries: Vec<PendingMutation> = load_json(cache, keys::PENDING_QUEUE).unwrap_or_default();
        Self {
            entries: entries.into(),
        }
    }

    pub fn persist<C: LocalCache + ?Sized>(&self, cache: &mut C) -> Result<(), CacheError> {
        store_json(cache, keys::PENDING_QUEUE, &self.entries)
    }

    /// Append a write. Returns false if an identical write is already queued.
    pub fn enqueue(&mut self, mutation: PendingMutation) -> bool {
        let key = mutation.key();
        if self.entries.iter().any(|m| m.key() == key) {
            return false;
        }
        tracing::debug!(kind = mutation.kind(), %key, "queued for sync");
        self.entries.push_back(mutation);
        true
    }

    pub fn front(&self) -> Option<&PendingMutation> {
        self.entries.front()
    }

    /// Remove the oldest entry after its write was confirmed.
    pub fn pop_confirmed(&mut self) -> Option<PendingMutation> {
        self.entries.pop_front()
    }

    /// Remove the entry with `key` after its write was confirmed out of
    /// band. Entries queued meanwhile stay where they are.
    pub fn confirm(&mut self, key: &str) -> bool {
        match self.entries.iter().position(|m| m.key() == key) {
            Some(index) => self.entries.remove(index).is_some(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingMutation> {
        self.entries.iter()
    }
}
