//! The unit stored in the pool's idle queue (§4.2).
//!
//! An [`Item`] is just a [`Cell`] plus an optional identity. The
//! `onInserted`/`consume` hooks the spec hangs off the item are instead
//! implemented centrally by a pool's [`Variant`] (§9's "capability
//! composition" over an abstract base): the plain variant's hooks are
//! no-ops, the expiring variant's schedule/cancel an eviction task keyed by
//! the item's identity. Both encode the same pairing — exactly one
//! `on_inserted` per successful insert, exactly one `on_consumed` per
//! departure — without needing a trait object per queued item.

use crate::retention::{Cell, ReclaimRegistry, Retention};
use std::sync::atomic::{AtomicU64, Ordering};

/// A monotonic per-pool item identity.
///
/// Two successive insertions of the same recycled value get distinct ids, so
/// an eviction task scheduled for one insertion can never destroy a later,
/// unrelated insertion of the same underlying value (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ItemId(u64);

#[derive(Debug, Default)]
pub(crate) struct ItemIdSource(AtomicU64);

impl ItemIdSource {
    pub(crate) fn next(&self) -> ItemId {
        ItemId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

pub(crate) struct Item<A> {
    cell: Cell<A>,
    id: Option<ItemId>,
}

impl<A> Item<A> {
    pub(crate) fn new(
        value: A,
        retention: Retention,
        registry: &ReclaimRegistry,
        id: Option<ItemId>,
    ) -> Self {
        Self { cell: Cell::new(value, retention, registry), id }
    }

    pub(crate) fn id(&self) -> Option<ItemId> {
        self.id
    }

    /// `isViable()` (§4.2): reachable and passes the health check.
    pub(crate) fn is_viable(&self, health_check: &(dyn Fn(&A) -> bool + Send + Sync)) -> bool {
        self.cell.get().is_some_and(health_check)
    }

    /// `take()` (§4.2): precondition is `is_viable()` observed true by the caller.
    pub(crate) fn take(self) -> A {
        self.cell.into_value().expect("take() called on a non-viable item")
    }

    /// `destroy()`'s value half: `None` means the runtime already reclaimed
    /// it, so the caller must decrement `live` but must not call `dispose`.
    pub(crate) fn into_value_for_destroy(self) -> Option<A> {
        self.cell.into_value()
    }
}

/// A pool's strategy for the `onInserted`/`consume` Item hooks (§4.2, §9).
pub(crate) trait Variant<A>: Send + Sync {
    /// Allocates a fresh item identity, or `None` if this variant doesn't use one.
    fn next_id(&self) -> Option<ItemId>;
    /// Runs immediately after a fresh item is successfully queued.
    fn on_inserted(&self, id: Option<ItemId>);
    /// Runs when an item leaves the queue via take or destroy.
    fn on_consumed(&self, id: Option<ItemId>);
    /// Runs once when the pool transitions to closed, to tear down any
    /// variant-specific background machinery (§4.5, §4.7: "cancel timer").
    fn on_close(&self) {}
}

/// The simple variant: no scheduled side effects.
#[derive(Debug, Default)]
pub(crate) struct Plain;

impl<A> Variant<A> for Plain {
    fn next_id(&self) -> Option<ItemId> {
        None
    }
    fn on_inserted(&self, _id: Option<ItemId>) {}
    fn on_consumed(&self, _id: Option<ItemId>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::ReclaimRegistry;

    #[test]
    fn ids_are_monotonic_and_distinct() {
        let src = ItemIdSource::default();
        let a = src.next();
        let b = src.next();
        assert_ne!(a, b);
    }

    #[test]
    fn viable_strong_item_round_trips() {
        let reg = ReclaimRegistry::new();
        let item = Item::new(10, Retention::Strong, &reg, None);
        assert!(item.is_viable(&|v: &i32| *v > 0));
        assert_eq!(item.take(), 10);
    }

    #[test]
    fn failing_health_check_makes_item_unviable() {
        let reg = ReclaimRegistry::new();
        let item = Item::new(-1, Retention::Strong, &reg, None);
        assert!(!item.is_viable(&|v: &i32| *v > 0));
    }

    #[test]
    fn reclaimed_item_is_unviable_and_destroys_without_a_value() {
        let reg = ReclaimRegistry::new();
        let item = Item::new(5, Retention::Weak, &reg, None);
        reg.simulate_aggressive_reclaim();
        assert!(!item.is_viable(&|_: &i32| true));
        assert_eq!(item.into_value_for_destroy(), None);
    }
}
