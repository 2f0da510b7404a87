//! Target values fixed on first computation.
//!
//! A retried Action must not move its target: after an ambiguous write the
//! next attempt writes the same value again instead of recomputing from a
//! value it may already have changed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared between an effect's precondition, action and notifier.
pub struct Pinned<T>(Arc<Mutex<Option<T>>>);

impl<T> Clone for Pinned<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Copy> Pinned<T> {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    fn slot(&self) -> MutexGuard<'_, Option<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> Option<T> {
        *self.slot()
    }

    pub fn is_pinned(&self) -> bool {
        self.slot().is_some()
    }

    /// The pinned value, computing (and pinning) it if there is none yet.
    /// `compute` returning `None` leaves the slot empty.
    pub fn get_or_pin(&self, compute: impl FnOnce() -> Option<T>) -> Option<T> {
        let mut slot = self.slot();
        if slot.is_none() {
            *slot = compute();
        }
        *slot
    }
}

impl<T: Copy> Default for Pinned<T> {
    fn default() -> Self {
        Self::new()
    }
}
