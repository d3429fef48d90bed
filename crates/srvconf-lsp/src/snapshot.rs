//! Revision tracking for cancellation of stale work.
//!
//! Every edit bumps the server's revision. Background work captures a
//! [`Snapshot`] and stops once the revision has moved on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A shared revision counter.
#[derive(Debug, Clone, Default)]
pub struct Revision(Arc<AtomicU64>);

impl Revision {
    /// Create a counter at revision zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the counter. Called whenever document or variable state changes.
    pub fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The current revision.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Capture the current revision.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            revision: self.current(),
            counter: self.clone(),
        }
    }
}

/// The revision at the time some work started.
#[derive(Debug, Clone)]
pub struct Snapshot {
    revision: u64,
    counter: Revision,
}

impl Snapshot {
    /// The captured revision.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether no change happened since the snapshot was taken.
    pub fn is_current(&self) -> bool {
        self.revision == self.counter.current()
    }

    /// Whether the work should be abandoned.
    pub fn is_cancelled(&self) -> bool {
        !self.is_current()
    }
}
