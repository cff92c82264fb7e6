//! Per-canvas reader/writer exclusion.
//!
//! Readers of one canvas share access; writers and deletes of that canvas
//! run alone. Different canvases never wait on each other. Entries are
//! dropped from the table as soon as nobody holds or waits on them.

use dashmap::DashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::id::CanvasId;

/// Lock table keyed by canvas id
#[derive(Debug, Default)]
pub struct CanvasLocks {
    table: DashMap<CanvasId, Arc<RwLock<()>>>,
}

impl CanvasLocks {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding shared access to `id`
    pub fn with_read<T>(&self, id: CanvasId, f: impl FnOnce() -> T) -> T {
        let entry = self.acquire(id);
        // The lock guards no data, so a panicked holder leaves nothing inconsistent.
        let _guard = entry.lock.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding exclusive access to `id`
    pub fn with_write<T>(&self, id: CanvasId, f: impl FnOnce() -> T) -> T {
        let entry = self.acquire(id);
        let _guard = entry.lock.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn acquire(&self, id: CanvasId) -> Entry<'_> {
        let lock = self.table.entry(id).or_default().clone();
        Entry {
            locks: self,
            id,
            lock,
        }
    }
}

/// Table reference held for the duration of one call. Dropping it prunes
/// the table entry, also when the closure unwinds.
struct Entry<'a> {
    locks: &'a CanvasLocks,
    id: CanvasId,
    lock: Arc<RwLock<()>>,
}

impl Drop for Entry<'_> {
    fn drop(&mut self) {
        // Our own clone keeps the count at 2 while we still hold it.
        self.locks
            .table
            .remove_if(&self.id, |_, entry| Arc::strong_count(entry) == 2);
    }
}
