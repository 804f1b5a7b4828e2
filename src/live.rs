//! The live counter (§4.4): how many objects currently exist, idle or leased.

use std::sync::atomic::{AtomicUsize, Ordering};

pub struct LiveCounter {
    capacity: usize,
    count: AtomicUsize,
}

impl LiveCounter {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, count: AtomicUsize::new(0) }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits one more live object if under capacity.
    ///
    /// Implemented as fetch-add followed by a compensating fetch-sub on
    /// overflow (§4.4) rather than a CAS loop: the calling thread may briefly
    /// observe `live == capacity + 1` on itself, but no other thread ever
    /// sees a value above `capacity` survive past this function.
    pub fn try_reserve(&self) -> bool {
        let prev = self.count.fetch_add(1, Ordering::SeqCst);
        if prev < self.capacity {
            true
        } else {
            self.count.fetch_sub(1, Ordering::SeqCst);
            false
        }
    }

    /// Releases one live slot. Must be paired with either a disposal or a
    /// successful insertion-then-eviction chain (§4.4).
    pub fn release(&self) {
        self.count.fetch_sub(1, Ordering::SeqCst);
    }
}
