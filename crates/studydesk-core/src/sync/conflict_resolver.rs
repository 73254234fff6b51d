//! Last-write-wins reconciliation of local and remote documents.

use std::collections::BTreeMap;

use crate::sync::types::Versioned;

/// Merge decision for one id present on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    UseLocal,
    UseRemote,
}

/// Remote wins only when strictly newer; ties keep the local copy.
pub fn decide<T: Versioned>(local: &T, remote: &T) -> MergeDecision {
    if remote.updated_at() > local.updated_at() {
        MergeDecision::UseRemote
    } else {
        MergeDecision::UseLocal
    }
}

/// Merge two document sets by id. Ids seen on only one side are kept;
/// shared ids go through [`decide`]. Output is ordered by id.
pub fn resolve<T: Versioned + Clone>(local: &[T], remote: &[T]) -> Vec<T> {
    let mut merged: BTreeMap<String, T> = local
        .iter()
        .map(|doc| (doc.id().to_string(), doc.clone()))
        .collect();

    for doc in remote {
        match merged.get(doc.id()) {
            Some(existing) if decide(existing, doc) == MergeDecision::UseLocal => {}
            _ => {
                merged.insert(doc.id().to_string(), doc.clone());
            }
        }
    }

    merged.into_values().collect()
}
