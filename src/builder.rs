//! Pool configuration (§4.8, §11).
//!
//! A `PoolBuilder` gathers a capacity, a factory, and the optional callbacks
//! before `build()` picks the variant: a finite `max_idle_time` builds an
//! expiring pool wired to a background eviction scheduler; leaving it unset
//! builds the simple pool with no scheduling overhead at all.

use std::time::Duration;

use crate::{
    pool::{Config, Pool},
    retention::Retention,
};

/// Builds a [`Pool`]. `A` is the pooled value; `E` is the factory's error
/// type, defaulting to [`Infallible`](std::convert::Infallible).
pub struct PoolBuilder<A, E = std::convert::Infallible> {
    capacity: usize,
    factory: Box<dyn Fn() -> Result<A, E> + Send + Sync>,
    retention: Retention,
    max_idle_time: Option<Duration>,
    reset: Box<dyn Fn(&mut A) + Send + Sync>,
    dispose: Box<dyn Fn(A) + Send + Sync>,
    health_check: Box<dyn Fn(&A) -> bool + Send + Sync>,
}

impl<A, E> PoolBuilder<A, E> {
    /// Starts a builder around a fallible factory, `capacity` the pool's
    /// bound on how many live values it will ever hold at once.
    pub fn new(capacity: usize, factory: impl Fn() -> Result<A, E> + Send + Sync + 'static) -> Self {
        Self {
            capacity,
            factory: Box::new(factory),
            retention: Retention::default(),
            max_idle_time: None,
            reset: Box::new(|_| {}),
            dispose: Box::new(|_| {}),
            health_check: Box::new(|_| true),
        }
    }

    /// Sets the retention mode for idle values (§4.1). Defaults to `Strong`.
    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Enables idle eviction: a value sitting idle longer than `duration`
    /// is disposed even without a further `acquire` (§4.7, §4.8). Selects
    /// the expiring pool variant at `build()`.
    pub fn max_idle_time(mut self, duration: Duration) -> Self {
        self.max_idle_time = Some(duration);
        self
    }

    /// Runs before a released value re-enters the idle queue.
    pub fn reset(mut self, reset: impl Fn(&mut A) + Send + Sync + 'static) -> Self {
        self.reset = Box::new(reset);
        self
    }

    /// Runs when a value is permanently discarded: invalidated, failing its
    /// health check, evicted for being idle too long, or drained on close.
    pub fn dispose(mut self, dispose: impl Fn(A) + Send + Sync + 'static) -> Self {
        self.dispose = Box::new(dispose);
        self
    }

    /// Runs when a value is about to be handed out by `acquire`; returning
    /// `false` destroys it and tries again instead (§4.2, §12: not run on
    /// release, only on extraction).
    pub fn health_check(mut self, health_check: impl Fn(&A) -> bool + Send + Sync + 'static) -> Self {
        self.health_check = Box::new(health_check);
        self
    }

    /// Builds the pool: expiring if [`max_idle_time`](Self::max_idle_time)
    /// was set, simple otherwise (§4.8).
    pub fn build(self) -> Pool<A, E>
    where
        A: Send + 'static,
        E: Send + 'static,
    {
        let max_idle_time = self.max_idle_time;
        let cfg = Config {
            capacity: self.capacity,
            retention: self.retention,
            factory: self.factory,
            reset: self.reset,
            dispose: self.dispose,
            health_check: self.health_check,
        };
        match max_idle_time {
            Some(duration) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(capacity = cfg.capacity, ?duration, "building expiring pool");
                Pool::new_expiring(cfg, duration)
            }
            None => {
                #[cfg(feature = "tracing")]
                tracing::debug!(capacity = cfg.capacity, "building simple pool");
                Pool::new_simple(cfg)
            }
        }
    }
}

impl<A> PoolBuilder<A, std::convert::Infallible> {
    /// Starts a builder around a factory that never fails.
    pub fn new_infallible(capacity: usize, factory: impl Fn() -> A + Send + Sync + 'static) -> Self {
        Self::new(capacity, move || Ok(factory()))
    }
}
