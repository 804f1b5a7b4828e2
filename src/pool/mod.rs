//! The pool's shared core (§4.5) and its public facade.
//!
//! `Inner<A, E, V>` holds everything a pool needs and is generic over the
//! [`Variant`] strategy that distinguishes the simple pool from the
//! expiring one (§9's "capability composition"). The public [`Pool`] type
//! erases both `V` and the concrete `Inner` behind `Arc<dyn PoolOps<A, E>>`
//! so callers hold one unparameterized handle no matter which variant they
//! built.

mod expiring;

pub use expiring::Expiring;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    error::{PoolError, PoolResult},
    item::{Item, Plain, Variant},
    lease::{Lease, LeaseBack},
    live::LiveCounter,
    queue::ItemQueue,
    retention::{ReclaimRegistry, Retention},
};

/// Everything a [`PoolBuilder`](crate::builder::PoolBuilder) gathers before
/// a pool is constructed.
pub(crate) struct Config<A, E> {
    pub capacity: usize,
    pub retention: Retention,
    pub factory: Box<dyn Fn() -> Result<A, E> + Send + Sync>,
    pub reset: Box<dyn Fn(&mut A) + Send + Sync>,
    pub dispose: Box<dyn Fn(A) + Send + Sync>,
    pub health_check: Box<dyn Fn(&A) -> bool + Send + Sync>,
}

pub(crate) struct Inner<A, E, V: Variant<A>> {
    queue: ItemQueue<Item<A>>,
    live: LiveCounter,
    closed: AtomicBool,
    registry: ReclaimRegistry,
    retention: Retention,
    factory: Box<dyn Fn() -> Result<A, E> + Send + Sync>,
    reset: Box<dyn Fn(&mut A) + Send + Sync>,
    dispose: Box<dyn Fn(A) + Send + Sync>,
    health_check: Box<dyn Fn(&A) -> bool + Send + Sync>,
    variant: V,
}

/// What came out of a non-blocking or blocking fast-path attempt (§4.5.1).
enum FastPath<A> {
    Viable(A),
    NeedBlock,
}

/// What came out of trying to hand a queued item to a caller (§4.2, §4.5.1).
enum Unwrapped<A> {
    Viable(A),
    Destroyed,
}

impl<A, E, V: Variant<A>> Inner<A, E, V> {
    fn new(cfg: Config<A, E>, variant: V) -> Self {
        Self {
            queue: ItemQueue::new(cfg.capacity),
            live: LiveCounter::new(cfg.capacity),
            closed: AtomicBool::new(false),
            registry: ReclaimRegistry::new(),
            retention: cfg.retention,
            factory: cfg.factory,
            reset: cfg.reset,
            dispose: cfg.dispose,
            health_check: cfg.health_check,
            variant,
        }
    }

    /// Hands a queued item to a caller if it's still viable, destroying it
    /// (and freeing its live slot) otherwise. Either way the variant's
    /// `on_consumed` hook runs exactly once (§4.2).
    fn unwrap_item(&self, item: Item<A>) -> Unwrapped<A> {
        if item.is_viable(&*self.health_check) {
            let id = item.id();
            let value = item.take();
            self.variant.on_consumed(id);
            Unwrapped::Viable(value)
        } else {
            self.destroy_item(item);
            Unwrapped::Destroyed
        }
    }

    /// Disposes a non-viable or no-longer-wanted item and frees its live slot.
    fn destroy_item(&self, item: Item<A>) {
        let id = item.id();
        self.variant.on_consumed(id);
        if let Some(value) = item.into_value_for_destroy() {
            (self.dispose)(value);
        }
        self.live.release();
    }

    /// Queues a freshly built (or reset, recycled) value. Always consumes
    /// `value`: on success it's now idle in the queue; on failure (a
    /// capacity race against a concurrent `close`/`fill`) it's disposed and
    /// its live slot released here, so the caller never has to know which
    /// happened.
    fn insert_new(&self, value: A) -> bool {
        let id = self.variant.next_id();
        let item = Item::new(value, self.retention, &self.registry, id);
        match self.queue.offer(item) {
            Ok(()) => {
                self.variant.on_inserted(id);
                true
            }
            Err(item) => {
                if let Some(v) = item.into_value_for_destroy() {
                    (self.dispose)(v);
                }
                self.live.release();
                false
            }
        }
    }

    /// Steps 1-3 of §4.5's acquisition algorithm: poll the idle queue
    /// (looping past destroyed, non-viable items, which don't count as
    /// "queue empty"), then try to build a fresh one under capacity.
    fn fast_path(&self) -> PoolResult<FastPath<A>, E> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }
        loop {
            match self.queue.poll() {
                Some(item) => match self.unwrap_item(item) {
                    Unwrapped::Viable(v) => return Ok(FastPath::Viable(v)),
                    Unwrapped::Destroyed => continue,
                },
                None => break,
            }
        }
        if self.live.try_reserve() {
            match (self.factory)() {
                Ok(v) => return Ok(FastPath::Viable(v)),
                Err(e) => {
                    self.live.release();
                    #[cfg(feature = "tracing")]
                    tracing::warn!("pool factory failed, live slot released");
                    return Err(PoolError::Factory(e));
                }
            }
        }
        Ok(FastPath::NeedBlock)
    }

    /// `acquire()` (§4.5): blocks indefinitely, but only ever fails with
    /// `PoolClosed`. The blocking wait is sliced so a concurrent `close()` is
    /// noticed promptly instead of parking forever on an empty queue.
    fn acquire(&self) -> PoolResult<A, E> {
        loop {
            if let FastPath::Viable(v) = self.fast_path()? {
                return Ok(v);
            }
            loop {
                if self.closed.load(Ordering::SeqCst) {
                    return Err(PoolError::Closed);
                }
                if let Some(item) = self.queue.poll_within(Duration::from_millis(50)) {
                    match self.unwrap_item(item) {
                        Unwrapped::Viable(v) => return Ok(v),
                        // a slot just freed up; retry the whole algorithm
                        // from the top rather than blocking again.
                        Unwrapped::Destroyed => break,
                    }
                }
            }
        }
    }

    /// `tryAcquire()` (§4.5): non-blocking; absent rather than an error if
    /// the pool would otherwise block.
    fn try_acquire(&self) -> PoolResult<Option<A>, E> {
        match self.fast_path()? {
            FastPath::Viable(v) => Ok(Some(v)),
            FastPath::NeedBlock => Ok(None),
        }
    }

    /// `tryAcquire(duration)` (§4.5): the timeout bounds only the blocking
    /// wait. A failed unwrap of the item that arrived within the budget does
    /// not get a second blocking wait (§4.5.1) but may still take the cheap,
    /// non-blocking retry of the fast path, since a live slot just freed up.
    fn try_acquire_timeout(&self, timeout: Duration) -> PoolResult<Option<A>, E> {
        match self.fast_path()? {
            FastPath::Viable(v) => return Ok(Some(v)),
            FastPath::NeedBlock => {}
        }
        match self.queue.poll_within(timeout) {
            Some(item) => match self.unwrap_item(item) {
                Unwrapped::Viable(v) => Ok(Some(v)),
                Unwrapped::Destroyed => match self.fast_path()? {
                    FastPath::Viable(v) => Ok(Some(v)),
                    FastPath::NeedBlock => Ok(None),
                },
            },
            None => Ok(None),
        }
    }

    /// `fill()` (§4.5): eagerly builds objects up to capacity.
    fn fill(&self) -> PoolResult<(), E> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }
        while self.live.try_reserve() {
            match (self.factory)() {
                Ok(mut v) => {
                    (self.reset)(&mut v);
                    if !self.insert_new(v) {
                        break;
                    }
                }
                Err(e) => {
                    self.live.release();
                    return Err(PoolError::Factory(e));
                }
            }
        }
        Ok(())
    }

    fn drain_now(&self) {
        self.queue.drain_each(|item| self.destroy_item(item));
    }

    /// `drain()` (§4.5): empties and disposes every currently idle value.
    fn drain(&self) -> PoolResult<(), E> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PoolError::Closed);
        }
        self.drain_now();
        Ok(())
    }

    /// `close()` (§4.5): one-shot. Idempotent past the first call. Runs any
    /// variant-specific teardown (expiring: cancel the eviction thread) right
    /// after draining so nothing idle survives the transition either way.
    fn close(&self) {
        if self.closed.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok() {
            #[cfg(feature = "tracing")]
            tracing::debug!(idle = self.queue.len(), "closing pool");
            self.drain_now();
            self.variant.on_close();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn size(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.live.capacity()
    }

    fn live(&self) -> usize {
        self.live.get()
    }

    fn leased(&self) -> usize {
        self.live().saturating_sub(self.size())
    }

    fn simulate_memory_pressure(&self) {
        self.registry.simulate_memory_pressure();
    }

    fn simulate_aggressive_reclaim(&self) {
        self.registry.simulate_aggressive_reclaim();
    }

    /// The lease-release half: resets and re-queues the value, or disposes
    /// it if the pool has since closed or the queue is unexpectedly full.
    fn lease_release(&self, mut value: A) {
        if self.closed.load(Ordering::SeqCst) {
            (self.dispose)(value);
            self.live.release();
            return;
        }
        (self.reset)(&mut value);
        self.insert_new(value);
    }

    /// The lease-invalidate half: the value is gone for good.
    fn lease_invalidate(&self, value: A) {
        (self.dispose)(value);
        self.live.release();
    }
}

impl<A, E, V: Variant<A>> Drop for Inner<A, E, V> {
    /// Finalizes every value still idle in the queue when the last `Pool`
    /// handle goes away, so `dispose` runs exactly once per produced object
    /// even for one nobody ever `close()`d (§3, §8.2). `close()` already did
    /// this for a closed pool; draining an already-empty queue is a no-op.
    /// Also runs the variant teardown so an expiring pool's eviction thread
    /// is stopped and joined before its captured closures are dropped.
    fn drop(&mut self) {
        self.drain_now();
        self.variant.on_close();
    }
}

impl<A: Send, E, V: Variant<A>> LeaseBack<A> for Inner<A, E, V> {
    fn release(&self, value: A) {
        self.lease_release(value);
    }
    fn invalidate(&self, value: A) {
        self.lease_invalidate(value);
    }
}

/// Type-erased operations a [`Pool`] delegates to, hiding which [`Variant`]
/// backs a particular pool. A supertrait of [`LeaseBack`] so one `Arc` can
/// serve both roles via trait upcasting.
pub(crate) trait PoolOps<A, E>: LeaseBack<A> + Send + Sync {
    fn acquire(&self) -> PoolResult<A, E>;
    fn try_acquire(&self) -> PoolResult<Option<A>, E>;
    fn try_acquire_timeout(&self, timeout: Duration) -> PoolResult<Option<A>, E>;
    fn fill(&self) -> PoolResult<(), E>;
    fn drain(&self) -> PoolResult<(), E>;
    fn close(&self);
    fn is_closed(&self) -> bool;
    fn size(&self) -> usize;
    fn capacity(&self) -> usize;
    fn live(&self) -> usize;
    fn leased(&self) -> usize;
    fn simulate_memory_pressure(&self);
    fn simulate_aggressive_reclaim(&self);
}

impl<A: Send, E, V: Variant<A>> PoolOps<A, E> for Inner<A, E, V> {
    fn acquire(&self) -> PoolResult<A, E> {
        Inner::acquire(self)
    }
    fn try_acquire(&self) -> PoolResult<Option<A>, E> {
        Inner::try_acquire(self)
    }
    fn try_acquire_timeout(&self, timeout: Duration) -> PoolResult<Option<A>, E> {
        Inner::try_acquire_timeout(self, timeout)
    }
    fn fill(&self) -> PoolResult<(), E> {
        Inner::fill(self)
    }
    fn drain(&self) -> PoolResult<(), E> {
        Inner::drain(self)
    }
    fn close(&self) {
        Inner::close(self)
    }
    fn is_closed(&self) -> bool {
        Inner::is_closed(self)
    }
    fn size(&self) -> usize {
        Inner::size(self)
    }
    fn capacity(&self) -> usize {
        Inner::capacity(self)
    }
    fn live(&self) -> usize {
        Inner::live(self)
    }
    fn leased(&self) -> usize {
        Inner::leased(self)
    }
    fn simulate_memory_pressure(&self) {
        Inner::simulate_memory_pressure(self)
    }
    fn simulate_aggressive_reclaim(&self) {
        Inner::simulate_aggressive_reclaim(self)
    }
}

/// A generic, thread-safe object pool.
///
/// `Pool<A, E>` is a thin, cloneable handle (an `Arc` underneath) shared by
/// every thread acquiring from it; dropping the last handle drops the pool
/// and, for an expiring pool, joins its eviction thread. `A` is the pooled
/// value; `E` is the error type the factory closure can fail with, and
/// defaults to [`Infallible`](std::convert::Infallible) for factories that
/// never fail.
///
/// Build one with [`PoolBuilder`](crate::builder::PoolBuilder).
pub struct Pool<A, E = std::convert::Infallible> {
    inner: Arc<dyn PoolOps<A, E>>,
}

impl<A, E> Clone for Pool<A, E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<A, E> fmt::Debug for Pool<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity())
            .field("live", &self.live())
            .field("size", &self.size())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<A, E> Pool<A, E> {
    pub(crate) fn new_simple(cfg: Config<A, E>) -> Self
    where
        A: Send + 'static,
        E: Send + 'static,
    {
        let inner: Arc<Inner<A, E, Plain>> = Arc::new(Inner::new(cfg, Plain));
        Self { inner }
    }

    pub(crate) fn new_expiring(cfg: Config<A, E>, max_idle_time: Duration) -> Self
    where
        A: Send + 'static,
        E: Send + 'static,
    {
        let inner: Arc<Inner<A, E, Expiring>> =
            Arc::new_cyclic(|weak| Inner::new(cfg, Expiring::new(max_idle_time, weak.clone())));
        Self { inner }
    }

    fn back(&self) -> Arc<dyn LeaseBack<A>>
    where
        A: 'static,
        E: 'static,
    {
        Arc::clone(&self.inner) as Arc<dyn LeaseBack<A>>
    }

    /// Blocks until a value is available, constructing one if the pool is
    /// under capacity. Never fails except [`PoolError::Closed`].
    pub fn acquire(&self) -> PoolResult<Lease<A>, E>
    where
        A: 'static,
        E: 'static,
    {
        let value = self.inner.acquire()?;
        Ok(Lease::new(value, self.back()))
    }

    /// Non-blocking `acquire`: `Ok(None)` rather than blocking if the pool
    /// is at capacity with nothing idle.
    pub fn try_acquire(&self) -> PoolResult<Option<Lease<A>>, E>
    where
        A: 'static,
        E: 'static,
    {
        Ok(self.inner.try_acquire()?.map(|v| Lease::new(v, self.back())))
    }

    /// `acquire`, bounded by `timeout`. `Ok(None)` on timeout, never an error
    /// for that case.
    pub fn try_acquire_timeout(&self, timeout: Duration) -> PoolResult<Option<Lease<A>>, E>
    where
        A: 'static,
        E: 'static,
    {
        Ok(self.inner.try_acquire_timeout(timeout)?.map(|v| Lease::new(v, self.back())))
    }

    /// Eagerly builds values up to capacity so later `acquire`s don't pay the
    /// factory's cost inline.
    pub fn fill(&self) -> PoolResult<(), E> {
        self.inner.fill()
    }

    /// Disposes every value currently idle in the pool. Leased values are
    /// unaffected and are disposed when released, if the pool has since
    /// closed.
    pub fn drain(&self) -> PoolResult<(), E> {
        self.inner.drain()
    }

    /// Closes the pool: idle values are drained and disposed immediately,
    /// blocked acquirers wake with [`PoolError::Closed`], and every future
    /// operation fails the same way. Idempotent.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// How many values are currently idle in the queue.
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// The pool's configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// How many values currently exist, idle or leased.
    pub fn live(&self) -> usize {
        self.inner.live()
    }

    /// How many values are currently leased out.
    pub fn leased(&self) -> usize {
        self.inner.leased()
    }

    /// Simulates a memory-pressure GC pass: every currently idle `Soft`
    /// value becomes unreachable (§4.1, §12).
    pub fn simulate_memory_pressure(&self) {
        self.inner.simulate_memory_pressure();
    }

    /// Simulates an aggressive reclaim pass: every currently idle `Soft` or
    /// `Weak` value becomes unreachable (§4.1, §12).
    pub fn simulate_aggressive_reclaim(&self) {
        self.inner.simulate_aggressive_reclaim();
    }
}
