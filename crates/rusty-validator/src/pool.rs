// File: src/pool.rs
// Purpose: Reusable per-call scratch buffers

use std::sync::{Mutex, PoisonError};

use crate::errors::FieldError;

/// Namespace buffers and error list for one top-level call
#[derive(Default)]
pub(crate) struct Scratch {
    pub ns: String,
    pub struct_ns: String,
    pub errors: Vec<FieldError>,
}

impl Scratch {
    fn reset(&mut self) {
        self.ns.clear();
        self.struct_ns.clear();
        self.errors.clear();
    }
}

/// Checkout/return pool of scratch state
///
/// Buffers are cleared on checkout, so a scratch that was never returned
/// cleanly cannot leak state into the next call.
pub(crate) struct ScratchPool {
    idle: Mutex<Vec<Scratch>>,
    capacity: usize,
}

impl ScratchPool {
    pub fn new(capacity: usize) -> Self {
        Self { idle: Mutex::new(Vec::with_capacity(capacity)), capacity }
    }

    pub fn checkout(&self) -> Scratch {
        let popped = self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop();
        let mut scratch = popped.unwrap_or_default();
        scratch.reset();
        scratch
    }

    pub fn give_back(&self, scratch: Scratch) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.capacity {
            idle.push(scratch);
        }
    }

    #[cfg(test)]
    pub fn idle(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_clears_buffers() {
        let pool = ScratchPool::new(2);
        let mut scratch = pool.checkout();
        scratch.ns.push_str("User.");
        scratch.struct_ns.push_str("User.");
        pool.give_back(scratch);
        assert_eq!(pool.idle(), 1);

        let scratch = pool.checkout();
        assert!(scratch.ns.is_empty());
        assert!(scratch.struct_ns.is_empty());
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_capacity_bounds_idle_buffers() {
        let pool = ScratchPool::new(1);
        pool.give_back(Scratch::default());
        pool.give_back(Scratch::default());
        assert_eq!(pool.idle(), 1);
    }
}
