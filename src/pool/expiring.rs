//! The expiring pool variant (§4.7, §4.8): every idle value gets its own
//! eviction deadline, serviced by one background [`Scheduler`] per pool.

use std::{
    sync::Weak,
    time::{Duration, Instant},
};

use crate::{
    item::{ItemId, ItemIdSource, Variant},
    scheduler::Scheduler,
};

use super::Inner;

/// The variant a pool built with a finite `max_idle_time` uses (§4.8): idle
/// values older than `max_idle_time` are evicted and disposed even if
/// nothing ever calls `acquire` again.
pub struct Expiring {
    ids: ItemIdSource,
    max_idle: Duration,
    scheduler: Scheduler,
}

impl Expiring {
    /// `weak` points back at the very [`Inner`] this variant will live
    /// inside, obtained from [`Arc::new_cyclic`] so the scheduler thread
    /// never keeps the pool alive by itself: once the last `Pool` handle
    /// drops, `weak.upgrade()` starts failing and eviction becomes a no-op
    /// until the scheduler thread is joined by `Inner`'s own drop.
    pub(crate) fn new<A, E>(max_idle: Duration, weak: Weak<Inner<A, E, Expiring>>) -> Self
    where
        A: Send + 'static,
        E: Send + 'static,
    {
        let scheduler = Scheduler::spawn(move |id| {
            if let Some(inner) = weak.upgrade() {
                inner.evict_idle(id);
            }
        });
        Self { ids: ItemIdSource::default(), max_idle, scheduler }
    }
}

impl<A> Variant<A> for Expiring {
    fn next_id(&self) -> Option<ItemId> {
        Some(self.ids.next())
    }

    fn on_inserted(&self, id: Option<ItemId>) {
        if let Some(id) = id {
            self.scheduler.schedule(id, Instant::now() + self.max_idle);
        }
    }

    fn on_consumed(&self, id: Option<ItemId>) {
        if let Some(id) = id {
            self.scheduler.cancel(id);
        }
    }

    fn on_close(&self) {
        self.scheduler.shutdown();
    }
}

impl<A, E> Inner<A, E, Expiring> {
    /// Runs on the scheduler thread when `id`'s deadline passes. If the item
    /// is no longer in the queue (already acquired, or evicted and raced
    /// away), this is a benign no-op (§4.7: "races are benign").
    fn evict_idle(&self, id: ItemId) {
        if let Some(item) = self.queue.remove_by(|item| item.id() == Some(id)) {
            #[cfg(feature = "tracing")]
            tracing::trace!(?id, "evicting idle value past max_idle_time");
            self.destroy_item(item);
        }
    }
}
