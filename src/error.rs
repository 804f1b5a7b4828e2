//! Structural error taxonomy for pool operations.
//!
//! The pool only ever surfaces two conditions as errors: the pool has been
//! closed, or a lease has already been consumed. Everything else that can go
//! wrong transiently (a full queue on release, a failed health check, a
//! GC-collected slot) is recovered from internally and never escapes the
//! public API. See the crate's `PoolClosed`/`LeaseConsumed` contract.

use std::fmt;

/// Errors produced by pool and lease operations.
///
/// `E` is the error type of the user-supplied factory closure. Pools whose
/// factory is infallible (returns `A` rather than `Result<A, E>`) use
/// [`Infallible`](std::convert::Infallible) for `E`, in which case
/// [`PoolError::Factory`] can never be constructed.
#[derive(thiserror::Error)]
pub enum PoolError<E = std::convert::Infallible> {
    /// The pool has been closed; no further acquisitions are possible.
    #[error("pool is closed")]
    Closed,
    /// The lease was already released or invalidated.
    #[error("lease has already been consumed")]
    LeaseConsumed,
    /// The factory closure failed while constructing a new object.
    ///
    /// The live counter's speculative reservation for the failed attempt has
    /// already been rolled back by the time this error reaches the caller.
    #[error("pool factory failed: {0}")]
    Factory(#[source] E),
}

impl<E: fmt::Debug> fmt::Debug for PoolError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("PoolError::Closed"),
            Self::LeaseConsumed => f.write_str("PoolError::LeaseConsumed"),
            Self::Factory(e) => f.debug_tuple("PoolError::Factory").field(e).finish(),
        }
    }
}

impl<E: PartialEq> PartialEq for PoolError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Closed, Self::Closed) => true,
            (Self::LeaseConsumed, Self::LeaseConsumed) => true,
            (Self::Factory(a), Self::Factory(b)) => a == b,
            _ => false,
        }
    }
}

/// A `Result` alias for fallible pool operations.
pub type PoolResult<T, E = std::convert::Infallible> = Result<T, PoolError<E>>;
