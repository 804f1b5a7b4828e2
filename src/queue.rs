//! The bounded item queue (§4.3).
//!
//! Built the way the teacher crate builds its own pools: a lock-free
//! [`crossbeam_queue::ArrayQueue`] holds the items, so `offer`/`poll` never
//! block and never take a lock. Blocking operations (`take`, `poll_within`)
//! and identity-based removal (used by idle eviction) are layered on top
//! with a `Mutex`/`Condvar` pair used only to park and wake waiters — the
//! hot non-blocking path never touches them.
//!
//! Any bounded MPMC queue with these five operations would do (§4.3); this
//! module is the adapter, not a queue implementation of its own.

use crossbeam_queue::ArrayQueue;
use std::{
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

pub struct ItemQueue<I> {
    inner: ArrayQueue<I>,
    // Guards nothing but the condvar wait/notify protocol; offer/poll/remove
    // operate on `inner` directly without acquiring it.
    parked: Mutex<()>,
    not_empty: Condvar,
}

impl<I> ItemQueue<I> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: ArrayQueue::new(capacity),
            parked: Mutex::new(()),
            not_empty: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Non-blocking insert. Returns the item back on failure (queue full).
    pub fn offer(&self, item: I) -> Result<(), I> {
        let res = self.inner.push(item);
        if res.is_ok() {
            // cheap to over-notify; waiters re-check the queue themselves
            self.not_empty.notify_one();
        }
        res
    }

    /// Non-blocking removal.
    pub fn poll(&self) -> Option<I> {
        self.inner.pop()
    }

    /// Blocks until an item is available.
    pub fn take(&self) -> I {
        loop {
            if let Some(item) = self.inner.pop() {
                return item;
            }
            let guard = self.parked.lock().unwrap();
            if !self.inner.is_empty() {
                continue;
            }
            // Bounded wait avoids a lost-wakeup hang if `offer` notified
            // between our emptiness check and taking the lock.
            let _ = self.not_empty.wait_timeout(guard, Duration::from_millis(20));
        }
    }

    /// Blocks until an item is available or `timeout` elapses.
    pub fn poll_within(&self, timeout: Duration) -> Option<I> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(item) = self.inner.pop() {
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let guard = self.parked.lock().unwrap();
            if !self.inner.is_empty() {
                continue;
            }
            let remaining = deadline - now;
            let wait = remaining.min(Duration::from_millis(20));
            let _ = self.not_empty.wait_timeout(guard, wait);
        }
    }

    /// Removes the first item matching `pred`, by draining and restoring the
    /// rest. Used only by idle eviction, which is a rare operation relative
    /// to offer/poll, so a linear scan is an acceptable cost for keeping the
    /// hot path lock-free.
    pub fn remove_by<F: FnMut(&I) -> bool>(&self, mut pred: F) -> Option<I> {
        let mut found = None;
        let mut spill = Vec::new();
        while let Some(item) = self.inner.pop() {
            if found.is_none() && pred(&item) {
                found = Some(item);
            } else {
                spill.push(item);
            }
        }
        for item in spill {
            // capacity cannot have shrunk, so this cannot fail
            let _ = self.inner.push(item);
        }
        found
    }

    /// Drains every item, handing each to `f`.
    pub fn drain_each(&self, mut f: impl FnMut(I)) {
        while let Some(item) = self.inner.pop() {
            f(item);
        }
    }
}
