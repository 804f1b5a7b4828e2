//! Reference cells and the Strong/Soft/Weak retention policy.
//!
//! This is the systems-language answer to the source library's reliance on a
//! tracing garbage collector for Soft/Weak reachability (see `SPEC_FULL.md`
//! §12). There is no runtime here to asynchronously decide that an idle
//! value is unreachable, so reclamation is instead an explicit, caller-driven
//! signal: [`ReclaimRegistry`] tracks every currently-idle Soft/Weak cell,
//! and [`Pool::simulate_memory_pressure`](crate::pool::Pool::simulate_memory_pressure)
//! / `simulate_aggressive_reclaim` flip their flags on demand.
//!
//! A cell only exists while its [`Item`](crate::item::Item) sits idle in the
//! queue. Once a value is taken out for a lease it is unwrapped into a bare
//! `A` with no cell at all, so leased-out objects are never candidates for
//! reclamation — matching the "idle references" framing of the source.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

/// Controls whether the runtime may reclaim an idle pooled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Retention {
    /// The value is always reachable; never reclaimed out from under the pool.
    #[default]
    Strong,
    /// The value may be reclaimed under memory pressure
    /// ([`Pool::simulate_memory_pressure`](crate::pool::Pool::simulate_memory_pressure)).
    Soft,
    /// The value may be reclaimed eagerly
    /// ([`Pool::simulate_aggressive_reclaim`](crate::pool::Pool::simulate_aggressive_reclaim)),
    /// a superset of the conditions that reclaim a [`Soft`](Retention::Soft) cell.
    Weak,
}

/// A registry of the "collected" flags for every currently-idle Soft or Weak
/// cell belonging to one pool.
///
/// Draining the registry and flipping every flag models a garbage collection
/// pass: any cell whose flag was never allocated (i.e. it was already taken
/// out of the queue by the time the pass ran) is simply not present and is
/// unaffected, which is exactly the semantics a real tracing GC would give a
/// value that became strongly reachable again before collection.
#[derive(Debug, Default)]
pub(crate) struct ReclaimRegistry {
    soft: Mutex<Vec<Arc<AtomicBool>>>,
    weak: Mutex<Vec<Arc<AtomicBool>>>,
}

impl ReclaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, retention: Retention) -> Option<Arc<AtomicBool>> {
        let flag = Arc::new(AtomicBool::new(false));
        match retention {
            Retention::Strong => return None,
            Retention::Soft => self.soft.lock().unwrap().push(Arc::clone(&flag)),
            Retention::Weak => self.weak.lock().unwrap().push(Arc::clone(&flag)),
        }
        Some(flag)
    }

    /// Flip every registered Soft flag. Models GC under memory pressure.
    pub fn simulate_memory_pressure(&self) {
        for flag in self.soft.lock().unwrap().drain(..) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    /// Flip every registered Soft *and* Weak flag. Models eager Weak reclamation.
    pub fn simulate_aggressive_reclaim(&self) {
        self.simulate_memory_pressure();
        for flag in self.weak.lock().unwrap().drain(..) {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

/// A holder for one pooled value under its configured retention mode.
pub(crate) enum Cell<A> {
    Strong(A),
    Reclaimable { value: A, collected: Arc<AtomicBool> },
}

impl<A> Cell<A> {
    pub(crate) fn new(value: A, retention: Retention, registry: &ReclaimRegistry) -> Self {
        match registry.register(retention) {
            None => Cell::Strong(value),
            Some(collected) => Cell::Reclaimable { value, collected },
        }
    }

    /// True iff the runtime has not (simulated-)reclaimed this cell.
    pub(crate) fn is_reachable(&self) -> bool {
        match self {
            Cell::Strong(_) => true,
            Cell::Reclaimable { collected, .. } => !collected.load(Ordering::SeqCst),
        }
    }

    /// Borrows the value iff still reachable.
    pub(crate) fn get(&self) -> Option<&A> {
        match self {
            Cell::Strong(v) => Some(v),
            Cell::Reclaimable { value, collected } => {
                if collected.load(Ordering::SeqCst) {
                    None
                } else {
                    Some(value)
                }
            }
        }
    }

    /// Consume the cell, returning the value if still reachable.
    ///
    /// Reclaimed cells still physically own an `A` in this implementation
    /// (Rust has no GC to have freed it out from under us), but the caller
    /// must treat the `None` arm as "already gone": in particular `dispose`
    /// must not be invoked for it, only the live counter decremented.
    pub(crate) fn into_value(self) -> Option<A> {
        match self {
            Cell::Strong(v) => Some(v),
            Cell::Reclaimable { value, collected } => {
                if collected.load(Ordering::SeqCst) {
                    drop(value);
                    None
                } else {
                    Some(value)
                }
            }
        }
    }
}
