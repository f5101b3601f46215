//! Intra-process status cache tier

use super::status::StorageStatuses;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// Statuses shared by every storage user within one process
#[derive(Debug, Default)]
pub struct SharedMemory {
    statuses: Mutex<StorageStatuses>,
}

impl SharedMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the statuses for the duration of one cache call
    pub fn lock(&self) -> MutexGuard<'_, StorageStatuses> {
        self.statuses.lock()
    }

    pub fn try_lock(&self) -> Option<MutexGuard<'_, StorageStatuses>> {
        self.statuses.try_lock()
    }
}

/// The process-wide memory tiers, one per usage mode
///
/// Created once by whatever composes the storage layer and handed to every
/// [`crate::MultiStorage`] it builds.
#[derive(Debug, Clone, Default)]
pub struct SharedMemories {
    pub read_write: Arc<SharedMemory>,
    pub read_only: Arc<SharedMemory>,
}

impl SharedMemories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory tier for read-write (`true`) or read-only usage
    pub fn for_mode(&self, read_write: bool) -> Arc<SharedMemory> {
        if read_write {
            Arc::clone(&self.read_write)
        } else {
            Arc::clone(&self.read_only)
        }
    }
}
