//! Offline-first synchronization with the remote document store.
//!
//! Writes that cannot reach the remote are queued locally and drained in
//! arrival order once connectivity returns. Documents present on both sides
//! are reconciled last-write-wins.

pub mod conflict_resolver;
pub mod http_store;
pub mod remote;
pub mod sync_engine;
pub mod sync_queue;
pub mod types;

#[cfg(test)]
mod sync_engine_tests;
#[cfg(test)]
mod sync_queue_tests;

pub use conflict_resolver::{decide, resolve, MergeDecision};
pub use http_store::HttpRemoteStore;
pub use remote::{MemoryRemote, RemoteStore};
pub use sync_engine::{
    drain_pending, merge_day, rehydrate_day, DayPull, DayReconciliation, RemoteDay, SyncBatch, SyncScheduler,
};
pub use sync_queue::PendingQueue;
pub use types::{
    Collection, DocumentMutation, DrainReport, MutationOp, PendingMutation, SyncStatus, Versioned,
};
