//! # Latest Value Cell
//!
//! A single slot shared between one background writer and the control loop. Writers overwrite the
//! slot, readers copy it out. Nothing is queued, an unread value is simply replaced by the next
//! one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared handle to a latest value slot. Clones refer to the same slot.
pub struct LatestValue<T> {
    slot: Arc<Mutex<Sample<T>>>,
}

/// Copy of a slot's contents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<T> {
    pub value: T,

    /// Number of times the slot has been written. Zero means `value` is still the initial value.
    pub num_updates: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Clone> LatestValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Sample {
                value: initial,
                num_updates: 0,
            })),
        }
    }

    /// Replace the held value.
    pub fn set(&self, value: T) {
        let mut slot = self.lock();
        slot.value = value;
        slot.num_updates += 1;
    }

    /// Copy out the held value.
    pub fn get(&self) -> Sample<T> {
        self.lock().clone()
    }

    // A writer panicking mid update can only have left a whole value behind, since values are
    // replaced by a single assignment, so a poisoned lock is still safe to read.
    fn lock(&self) -> MutexGuard<Sample<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for LatestValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Sample<T> {
    /// True once the slot has been written at least once.
    pub fn received(&self) -> bool {
        self.num_updates > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread;

    #[test]
    fn test_last_value_wins() {
        let cell = LatestValue::new(0u32);
        assert!(!cell.get().received());

        cell.set(1);
        cell.set(2);

        let s = cell.get();
        assert_eq!(s.value, 2);
        assert_eq!(s.num_updates, 2);
    }

    /// Reads concurrent with writes always see a whole vector.
    #[test]
    fn test_no_tearing() {
        let cell = LatestValue::new([0f64; 6]);
        let writer = cell.clone();

        let jh = thread::spawn(move || {
            for i in 0..20_000 {
                writer.set([i as f64; 6]);
            }
        });

        for _ in 0..20_000 {
            let v = cell.get().value;
            assert!(v.iter().all(|x| *x == v[0]));
        }

        jh.join().unwrap();
        assert_eq!(cell.get().value, [19_999.0; 6]);
    }
}
