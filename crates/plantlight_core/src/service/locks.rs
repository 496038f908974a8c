//! Per-plant mutual exclusion.
//!
//! # Invariants
//! - At most one guard per plant id exists at any time.
//! - Guards release on drop, including during unwinding.

use crate::model::plant::PlantId;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One logical lock per plant. Different plants never contend.
#[derive(Debug, Default)]
pub struct PlantLocks {
    busy: Mutex<HashSet<PlantId>>,
    released: Condvar,
}

/// Held while a plant's samples or reminders are being mutated.
#[derive(Debug)]
pub struct PlantGuard<'a> {
    locks: &'a PlantLocks,
    plant_id: PlantId,
}

impl PlantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the plant is free, then claims it.
    pub fn lock(&self, plant_id: PlantId) -> PlantGuard<'_> {
        let mut busy = self.busy_set();
        while busy.contains(&plant_id) {
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(plant_id);
        PlantGuard {
            locks: self,
            plant_id,
        }
    }

    /// Claims the plant only if nobody holds it.
    pub fn try_lock(&self, plant_id: PlantId) -> Option<PlantGuard<'_>> {
        let mut busy = self.busy_set();
        if !busy.insert(plant_id) {
            return None;
        }
        Some(PlantGuard {
            locks: self,
            plant_id,
        })
    }

    pub fn is_locked(&self, plant_id: PlantId) -> bool {
        self.busy_set().contains(&plant_id)
    }

    // The set is only touched by single insert/remove calls, so a poisoned
    // lock still guards a consistent set.
    fn busy_set(&self) -> MutexGuard<'_, HashSet<PlantId>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PlantGuard<'_> {
    pub fn plant_id(&self) -> PlantId {
        self.plant_id
    }
}

impl Drop for PlantGuard<'_> {
    fn drop(&mut self) {
        self.locks.busy_set().remove(&self.plant_id);
        self.locks.released.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::PlantLocks;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn try_lock_fails_while_held_and_succeeds_after_release() {
        let locks = PlantLocks::new();
        let plant_id = Uuid::new_v4();
        let guard = locks.lock(plant_id);
        assert!(locks.try_lock(plant_id).is_none());
        assert!(locks.try_lock(Uuid::new_v4()).is_some());
        drop(guard);
        assert!(!locks.is_locked(plant_id));
        assert!(locks.try_lock(plant_id).is_some());
    }

    #[test]
    fn lock_waits_for_release() {
        let locks = Arc::new(PlantLocks::new());
        let plant_id = Uuid::new_v4();
        let guard = locks.lock(plant_id);

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                let guard = locks.lock(plant_id);
                guard.plant_id()
            })
        };

        thread::sleep(Duration::from_millis(20));
        assert!(!waiter.is_finished());
        drop(guard);
        assert_eq!(waiter.join().unwrap(), plant_id);
    }
}
