//! A single checked-out pool value (§4.6).
//!
//! `Lease<A>` is deliberately generic over `A` alone; it holds the pool it
//! came from behind a type-erased `Arc<dyn LeaseBack<A>>` so that callers
//! never have to name the pool's error type or its internal variant just to
//! hold a lease.

use std::{fmt, sync::Arc};

use crate::error::{PoolError, PoolResult};

/// The pool-side half of a lease: what happens to the value on release or
/// invalidation. Implemented by the pool's shared inner state; hidden behind
/// a trait object so `Lease<A>` doesn't need to carry the pool's error type
/// or variant as generic parameters.
pub(crate) trait LeaseBack<A>: Send + Sync {
    fn release(&self, value: A);
    fn invalidate(&self, value: A);
}

/// A handle to one value currently checked out of a pool.
///
/// `Active → { Released, Invalidated }` (§4.6): the transition happens at
/// most once, enforced by `value` going from `Some` to `None`. Dropping a
/// lease without calling [`release`](Lease::release) or
/// [`invalidate`](Lease::invalidate) releases it, so a lease can never leak
/// its slot back to the pool, whether by an early return, a `?`, or a panic.
pub struct Lease<A> {
    value: Option<A>,
    back: Arc<dyn LeaseBack<A>>,
}

impl<A: PartialEq> PartialEq for Lease<A> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<A> Lease<A> {
    pub(crate) fn new(value: A, back: Arc<dyn LeaseBack<A>>) -> Self {
        Self { value: Some(value), back }
    }

    /// Borrows the leased value, or [`PoolError::LeaseConsumed`] if `release`
    /// or `invalidate` already ran.
    pub fn get(&self) -> PoolResult<&A> {
        self.value.as_ref().ok_or(PoolError::LeaseConsumed)
    }

    /// Mutably borrows the leased value. Same error condition as [`get`](Lease::get).
    pub fn get_mut(&mut self) -> PoolResult<&mut A> {
        self.value.as_mut().ok_or(PoolError::LeaseConsumed)
    }

    /// Returns the value to the pool's idle queue for reuse, running the
    /// pool's `reset` callback first. A no-op on an already-consumed lease,
    /// reported as [`PoolError::LeaseConsumed`].
    pub fn release(mut self) -> PoolResult<()> {
        match self.value.take() {
            Some(v) => {
                self.back.release(v);
                Ok(())
            }
            None => Err(PoolError::LeaseConsumed),
        }
    }

    /// Discards the value permanently, running the pool's `dispose` callback
    /// and freeing its live slot for a fresh construction. A no-op on an
    /// already-consumed lease, reported as [`PoolError::LeaseConsumed`].
    pub fn invalidate(mut self) -> PoolResult<()> {
        match self.value.take() {
            Some(v) => {
                self.back.invalidate(v);
                Ok(())
            }
            None => Err(PoolError::LeaseConsumed),
        }
    }

    /// Runs `f` over the leased value and terminates the lease afterward
    /// according to `f`'s [`UseOutcome`] — `release` by default, or
    /// `invalidate` if `f` decides the value is no longer fit for reuse
    /// (§4.6: "may be invalidated from inside `f`"). If `f` panics the value
    /// is released, not invalidated: that happens in `Drop`, which runs
    /// during unwinding same as on a normal return, since a panic inside `f`
    /// says nothing about whether the value itself is still fit for reuse.
    pub fn use_with<R>(mut self, f: impl FnOnce(&mut A) -> UseOutcome<R>) -> R {
        let value = self.value.as_mut().expect("lease already consumed");
        let outcome = f(value);
        let value = self.value.take().expect("lease already consumed");
        if outcome.invalidate {
            self.back.invalidate(value);
        } else {
            self.back.release(value);
        }
        outcome.value
    }
}

/// What [`Lease::use_with`]'s closure decides to do with the lease once it
/// returns: keep the value in circulation, or invalidate it, alongside
/// whatever result the closure computed.
pub struct UseOutcome<R> {
    value: R,
    invalidate: bool,
}

impl<R> UseOutcome<R> {
    /// Releases the value back to the pool after `f` returns.
    pub fn keep(value: R) -> Self {
        Self { value, invalidate: false }
    }

    /// Invalidates the value instead of releasing it after `f` returns.
    pub fn invalidate(value: R) -> Self {
        Self { value, invalidate: true }
    }
}

impl<A> Drop for Lease<A> {
    fn drop(&mut self) {
        if let Some(v) = self.value.take() {
            self.back.release(v);
        }
    }
}

impl<A: fmt::Debug> fmt::Debug for Lease<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("value", &self.value).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<&'static str>>);

    impl LeaseBack<i32> for Recorder {
        fn release(&self, _value: i32) {
            self.0.lock().unwrap().push("release");
        }
        fn invalidate(&self, _value: i32) {
            self.0.lock().unwrap().push("invalidate");
        }
    }

    #[test]
    fn drop_without_consuming_releases() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        {
            let _lease = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        }
        assert_eq!(*back.0.lock().unwrap(), vec!["release"]);
    }

    #[test]
    fn explicit_invalidate_does_not_also_release_on_drop() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        let lease = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        lease.invalidate().unwrap();
        assert_eq!(*back.0.lock().unwrap(), vec!["invalidate"]);
    }

    #[test]
    fn second_release_reports_consumed() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        let lease = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        // release consumes `self`; simulate a second attempt via a fresh
        // lease whose value has already been taken.
        let mut consumed = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        consumed.value = None;
        assert_eq!(consumed.release(), Err(PoolError::LeaseConsumed));
        lease.release().unwrap();
    }

    #[test]
    fn use_with_releases_even_when_the_closure_panics() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        let lease = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            lease.use_with(|_v| -> UseOutcome<()> { panic!("boom") });
        }));
        assert!(result.is_err());
        assert_eq!(*back.0.lock().unwrap(), vec!["release"]);
    }

    #[test]
    fn use_with_returns_the_closures_value_and_then_releases() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        let lease = Lease::new(41, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        let doubled = lease.use_with(|v| {
            *v += 1;
            UseOutcome::keep(*v * 2)
        });
        assert_eq!(doubled, 84);
        assert_eq!(*back.0.lock().unwrap(), vec!["release"]);
    }

    #[test]
    fn use_with_invalidates_when_the_closure_says_so() {
        let back = Arc::new(Recorder(Mutex::new(Vec::new())));
        let lease = Lease::new(1, Arc::clone(&back) as Arc<dyn LeaseBack<i32>>);
        let result = lease.use_with(|v| UseOutcome::invalidate(*v + 1));
        assert_eq!(result, 2);
        assert_eq!(*back.0.lock().unwrap(), vec!["invalidate"]);
    }
}
