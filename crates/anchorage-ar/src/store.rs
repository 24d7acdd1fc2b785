use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anchorage_3d::depth::DepthSnapshot;
use parking_lot::RwLock;

/// Single-slot holder of the most recent depth snapshot.
///
/// Writers replace the whole snapshot; readers get a shared handle to a complete snapshot.
/// The lock only guards the pointer swap, so a new snapshot never waits for a placement
/// that is still using the previous one.
#[derive(Debug, Default)]
pub struct DepthSnapshotStore {
    slot: RwLock<Option<Arc<DepthSnapshot>>>,
    updates: AtomicU64,
}

impl DepthSnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot.
    pub fn update(&self, snapshot: Arc<DepthSnapshot>) {
        let previous = self.slot.write().replace(snapshot);
        self.updates.fetch_add(1, Ordering::Relaxed);
        // the old snapshot is released outside the lock
        drop(previous);
    }

    /// The most recent snapshot, or `None` if no depth data arrived yet.
    pub fn latest(&self) -> Option<Arc<DepthSnapshot>> {
        self.slot.read().clone()
    }

    /// Forget the stored snapshot.
    pub fn clear(&self) {
        let previous = self.slot.write().take();
        drop(previous);
    }

    /// Number of snapshots received since the store was created.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}
