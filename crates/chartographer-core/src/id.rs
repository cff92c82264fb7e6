//! Canvas identifiers and the counter that proposes new ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// First id handed out by a fresh allocator
const FIRST_ID: u32 = 1;

/// Identifier of a stored canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanvasId(u32);

impl CanvasId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CanvasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CanvasId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Monotonic source of candidate ids.
///
/// Candidates are not guaranteed to be unused: the store checks each one
/// against the filesystem before claiming it.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicU32,
}

impl IdAllocator {
    /// Create an allocator starting at 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(FIRST_ID),
        }
    }

    /// Next candidate id, or `None` once the id space is exhausted
    pub fn next(&self) -> Option<CanvasId> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(1)
            })
            .ok()
            .map(CanvasId)
    }

    /// Restart the sequence from 1
    #[cfg(any(test, feature = "test-support"))]
    pub fn reset(&self) {
        self.next.store(FIRST_ID, Ordering::SeqCst);
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
