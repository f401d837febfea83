//! Per-key locks serializing actions on the same battle or beast.
//!
//! Locks are always taken in ascending `LockKey` order: battles, then the
//! battle counter, then beasts. Actions that follow this order cannot
//! deadlock against each other.

use std::sync::Arc;

use arena_common::{BattleId, BeastId};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};

/// A lockable record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    /// A battle record.
    Battle(BattleId),
    /// The battle id counter.
    Counter,
    /// A beast and its stats.
    Beast(BeastId),
}

/// Registry of per-key mutexes.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutex handles for `keys`, sorted and deduplicated.
    #[must_use]
    pub fn handles(&self, keys: &[LockKey]) -> Vec<Arc<Mutex<()>>> {
        let mut keys = keys.to_vec();
        keys.sort_unstable();
        keys.dedup();
        keys.into_iter()
            .map(|key| Arc::clone(self.locks.entry(key).or_default().value()))
            .collect()
    }

    /// Number of keys ever locked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no key was ever locked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Locks every handle in order; guards release on drop.
#[must_use]
pub fn lock_all(handles: &[Arc<Mutex<()>>]) -> Vec<MutexGuard<'_, ()>> {
    handles.iter().map(|m| m.lock()).collect()
}
