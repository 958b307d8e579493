//! Per-collection in-flight locks.
//!
//! A collection is synced by at most one worker at a time. Contenders skip
//! rather than queue: the running sync will finish momentarily and the
//! skipped collection comes back on a later tick.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

#[derive(Clone, Default)]
pub struct LockRegistry {
    in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim a collection. `None` means a sync is already running.
    pub fn try_acquire(&self, collection_id: Uuid) -> Option<LockGuard> {
        let mut set = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if set.insert(collection_id) {
            Some(LockGuard {
                registry: self.clone(),
                collection_id,
            })
        } else {
            None
        }
    }

    pub fn is_locked(&self, collection_id: Uuid) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&collection_id)
    }

    fn release(&self, collection_id: Uuid) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&collection_id);
    }
}

/// Releases the claim on drop, so a panicking or erroring sync never
/// leaves its collection wedged.
pub struct LockGuard {
    registry: LockRegistry,
    collection_id: Uuid,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.registry.release(self.collection_id);
    }
}
