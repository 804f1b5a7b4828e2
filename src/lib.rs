//! A generic, thread-safe object pool with leases, idle eviction, and
//! soft/weak retention.
//!
//! # Quick Start
//!
//! ```
//! use leasepool::PoolBuilder;
//!
//! // A pool of up to 16 Strings, built lazily on first use.
//! let pool: leasepool::Pool<String> =
//!     PoolBuilder::new_infallible(16, String::new).build();
//!
//! let mut lease = pool.acquire().unwrap();
//! lease.get_mut().unwrap().push_str("hello");
//! lease.release().unwrap(); // cleared by `reset` and returned for reuse
//! ```
//!
//! # Which Pool Should I Use?
//!
//! - **No `max_idle_time`** (default): a [`Pool`] with no background
//!   thread. Values sit in the idle queue until acquired again or the pool
//!   is drained or closed.
//! - **With [`PoolBuilder::max_idle_time`]**: the same [`Pool`], but a
//!   dedicated eviction thread disposes of any value that's been idle
//!   longer than the given duration, even if nothing ever acquires it
//!   again. Useful for pooled connections or other resources that are
//!   wasteful to hold open indefinitely.
//!
//! Both are the same `Pool<A, E>` type; the variant is an internal
//! implementation detail selected by the builder.
//!
//! # Retention
//!
//! Idle values default to [`Retention::Strong`]: they live until acquired,
//! evicted, or drained. [`Retention::Soft`] and [`Retention::Weak`] values
//! can additionally be reclaimed by [`Pool::simulate_memory_pressure`] and
//! [`Pool::simulate_aggressive_reclaim`] — there is no tracing garbage
//! collector in a Rust program to do this on its own, so these are explicit,
//! caller-driven stand-ins for "the runtime decided it needed the memory
//! back" (see `DESIGN.md` for the full reasoning).
//!
//! ```
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use leasepool::{PoolBuilder, Retention};
//!
//! let builds = Arc::new(AtomicUsize::new(0));
//! let builds2 = Arc::clone(&builds);
//! let pool = PoolBuilder::new_infallible(4, move || {
//!     builds2.fetch_add(1, Ordering::SeqCst)
//! })
//! .retention(Retention::Soft)
//! .build();
//!
//! let lease = pool.acquire().unwrap();
//! lease.release().unwrap();
//! pool.simulate_memory_pressure();
//! // the idle value is now unreachable; the next acquire builds a fresh one
//! // instead of reusing it.
//! let _lease2 = pool.acquire().unwrap();
//! assert_eq!(builds.load(Ordering::SeqCst), 2);
//! ```
//!
//! # Error Handling
//!
//! Acquisition only ever fails with [`PoolError::Closed`] or, if the
//! factory is fallible, [`PoolError::Factory`]. Timeouts and non-blocking
//! misses are not errors: they come back as `Ok(None)`.

mod builder;
mod error;
mod item;
mod lease;
mod live;
mod pool;
mod queue;
mod retention;
mod scheduler;

pub use builder::PoolBuilder;
pub use error::{PoolError, PoolResult};
pub use lease::{Lease, UseOutcome};
pub use pool::Pool;
pub use retention::Retention;
