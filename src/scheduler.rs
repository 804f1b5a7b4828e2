//! The expiring variant's eviction scheduler (§4.7).
//!
//! One dedicated background thread per pool, shared by every item's timer
//! task, exactly as §5 calls for ("a single dedicated daemon thread or
//! equivalent"). The thread sleeps on a condition variable until the
//! earliest deadline in a min-heap, fires every task whose deadline has
//! passed, and re-checks a cancellation set before actually evicting —
//! `consume()` cancelling a task and the task itself racing to fire are both
//! tolerated (§4.7: "races are benign").
//!
//! The eviction callback is handed in as a plain closure rather than a trait
//! object; the pool that owns a `Scheduler` builds that closure around a
//! `Weak` reference to its own shared state, so the scheduler thread never
//! keeps the pool alive on its own.

use crate::item::ItemId;
use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Condvar, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

#[derive(Eq, PartialEq)]
struct HeapEntry {
    deadline: Instant,
    id: ItemId,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline)
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

struct State {
    tasks: Mutex<BinaryHeap<Reverse<HeapEntry>>>,
    cancelled: Mutex<HashSet<ItemId>>,
    wake: Condvar,
    stop: AtomicBool,
}

pub(crate) struct Scheduler {
    state: Arc<State>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub(crate) fn spawn<F>(evict: F) -> Self
    where
        F: Fn(ItemId) + Send + 'static,
    {
        let state = Arc::new(State {
            tasks: Mutex::new(BinaryHeap::new()),
            cancelled: Mutex::new(HashSet::new()),
            wake: Condvar::new(),
            stop: AtomicBool::new(false),
        });
        let worker_state = Arc::clone(&state);
        let thread = thread::Builder::new()
            .name("leasepool-evictor".into())
            .spawn(move || Self::run(worker_state, evict))
            .expect("failed to spawn pool eviction thread");
        Self { state, thread: Mutex::new(Some(thread)) }
    }

    fn run(state: Arc<State>, evict: impl Fn(ItemId)) {
        loop {
            if state.stop.load(Ordering::SeqCst) {
                return;
            }
            let mut tasks = state.tasks.lock().unwrap();
            let now = Instant::now();
            match tasks.peek() {
                None => {
                    let (guard, _) =
                        state.wake.wait_timeout(tasks, Duration::from_millis(100)).unwrap();
                    drop(guard);
                }
                Some(Reverse(entry)) if entry.deadline > now => {
                    let wait = entry.deadline - now;
                    let (guard, _) = state.wake.wait_timeout(tasks, wait).unwrap();
                    drop(guard);
                }
                Some(_) => {
                    let Reverse(entry) = tasks.pop().unwrap();
                    drop(tasks);
                    let mut cancelled = state.cancelled.lock().unwrap();
                    let was_cancelled = cancelled.remove(&entry.id);
                    drop(cancelled);
                    if !was_cancelled {
                        evict(entry.id);
                    }
                }
            }
        }
    }

    /// Schedules an eviction attempt for `id` at `deadline`.
    ///
    /// If this races with `close()` shutting the scheduler down, the task is
    /// simply never serviced (§4.7: "rejects scheduling after cancellation…
    /// may fail silently").
    pub(crate) fn schedule(&self, id: ItemId, deadline: Instant) {
        if self.state.stop.load(Ordering::SeqCst) {
            return;
        }
        self.state.tasks.lock().unwrap().push(Reverse(HeapEntry { deadline, id }));
        self.state.wake.notify_all();
    }

    /// Cancels `id`'s scheduled task, if it hasn't fired yet.
    pub(crate) fn cancel(&self, id: ItemId) {
        self.state.cancelled.lock().unwrap().insert(id);
    }

    /// Stops the background thread. Idempotent, safe to call concurrently.
    pub(crate) fn shutdown(&self) {
        self.state.stop.store(true, Ordering::SeqCst);
        self.state.wake.notify_all();
        if let Some(t) = self.thread.lock().unwrap().take() {
            let _ = t.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
