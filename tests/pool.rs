use leasepool::{PoolBuilder, PoolError, Retention, UseOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn counted_factory() -> (impl Fn() -> u32 + Clone, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    (move || counter.fetch_add(1, Ordering::SeqCst) as u32, built)
}

#[test]
fn objects_are_constructed_lazily_up_to_capacity() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(3, factory).build();
    assert_eq!(built.load(Ordering::SeqCst), 0, "nothing built before the first acquire");

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_eq!(pool.try_acquire().unwrap().is_some(), true);
    assert_eq!(built.load(Ordering::SeqCst), 3);
    assert_eq!(pool.try_acquire().unwrap(), None, "capacity is exhausted");

    drop(a);
    drop(b);
}

#[test]
fn blocked_acquirer_is_unblocked_by_a_release() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).build();
    let lease = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    let pool2 = pool.clone();
    let waiter = thread::spawn(move || pool2.acquire());

    thread::sleep(Duration::from_millis(100));
    lease.release().unwrap();

    let second = waiter.join().unwrap().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1, "the released value was reused");
    drop(second);
}

#[test]
fn timed_acquire_reports_absence_rather_than_an_error() {
    let pool = PoolBuilder::new_infallible(1, || 0u32).build();
    let _lease = pool.acquire().unwrap();
    let start = std::time::Instant::now();
    let outcome = pool.try_acquire_timeout(Duration::from_millis(80)).unwrap();
    assert_eq!(outcome, None);
    assert!(start.elapsed() >= Duration::from_millis(80));
}

#[test]
fn idle_values_expire_after_max_idle_time() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let disposed_for_close = Arc::clone(&disposed);
    let pool = PoolBuilder::new_infallible(2, || 0u32)
        .max_idle_time(Duration::from_millis(60))
        .dispose(move |_| {
            disposed_for_close.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    a.release().unwrap();
    b.release().unwrap();
    assert_eq!(pool.live(), 2);

    thread::sleep(Duration::from_millis(400));
    assert_eq!(pool.live(), 0);
    assert_eq!(disposed.load(Ordering::SeqCst), 2);
}

#[test]
fn a_leased_value_is_immune_to_idle_eviction_but_its_sibling_still_expires() {
    let disposed = Arc::new(AtomicUsize::new(0));
    let disposed_for_close = Arc::clone(&disposed);
    let pool = PoolBuilder::new_infallible(2, || 0u32)
        .max_idle_time(Duration::from_millis(60))
        .dispose(move |_| {
            disposed_for_close.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let held = pool.acquire().unwrap();
    let idle = pool.acquire().unwrap();
    idle.release().unwrap();
    assert_eq!(pool.live(), 2);

    thread::sleep(Duration::from_millis(400));
    assert_eq!(pool.live(), 1, "only the idle value expired");
    assert_eq!(disposed.load(Ordering::SeqCst), 1);

    held.release().unwrap();
}

#[test]
fn soft_values_are_reclaimed_under_simulated_memory_pressure() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).retention(Retention::Soft).build();

    let lease = pool.acquire().unwrap();
    lease.release().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1);

    pool.simulate_memory_pressure();
    // the reclaimed cell is discovered, and a fresh value built, on the
    // next acquire rather than eagerly.
    let lease2 = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
    lease2.release().unwrap();
}

#[test]
fn weak_values_survive_a_memory_pressure_pass_but_not_an_aggressive_reclaim() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).retention(Retention::Weak).build();

    let lease = pool.acquire().unwrap();
    lease.release().unwrap();
    pool.simulate_memory_pressure();
    assert_eq!(pool.try_acquire().unwrap().map(|l| l.get().unwrap().clone()), Some(0));
    assert_eq!(built.load(Ordering::SeqCst), 1, "weak survives a soft-only pass");

    pool.drain().unwrap();
    let lease = pool.acquire().unwrap();
    lease.release().unwrap();
    pool.simulate_aggressive_reclaim();
    let lease2 = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 3);
    lease2.release().unwrap();
}

#[test]
fn a_closed_pool_rejects_every_operation() {
    let pool = PoolBuilder::new_infallible(2, || 0u32).build();
    let lease = pool.acquire().unwrap();
    lease.release().unwrap();
    pool.close();

    assert_eq!(pool.acquire().unwrap_err(), PoolError::Closed);
    assert_eq!(pool.try_acquire().unwrap_err(), PoolError::Closed);
    assert_eq!(pool.try_acquire_timeout(Duration::from_millis(10)).unwrap_err(), PoolError::Closed);
    assert_eq!(pool.fill().unwrap_err(), PoolError::Closed);
    assert_eq!(pool.drain().unwrap_err(), PoolError::Closed);
    assert_eq!(pool.size(), 0, "closing drained whatever was idle");
}

#[test]
fn close_wakes_every_blocked_acquirer() {
    let pool = PoolBuilder::new_infallible(1, || 0u32).build();
    let _lease = pool.acquire().unwrap();

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire())
        })
        .collect();

    thread::sleep(Duration::from_millis(100));
    pool.close();

    for w in waiters {
        assert_eq!(w.join().unwrap().unwrap_err(), PoolError::Closed);
    }
}

#[test]
fn fill_builds_up_to_capacity_without_any_acquire() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(5, factory).build();
    pool.fill().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 5);
    assert_eq!(pool.size(), 5);
    assert_eq!(pool.live(), 5);
}

#[test]
fn released_lease_runs_reset_before_reentering_the_queue() {
    let pool = PoolBuilder::new_infallible(1, Vec::<u32>::new)
        .reset(|v| v.clear())
        .build();
    let mut lease = pool.acquire().unwrap();
    lease.get_mut().unwrap().extend([1, 2, 3]);
    lease.release().unwrap();
    let lease2 = pool.acquire().unwrap();
    assert!(lease2.get().unwrap().is_empty());
}

#[test]
fn invalidate_disposes_and_a_fresh_value_is_built_on_next_acquire() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).build();
    let lease = pool.acquire().unwrap();
    lease.invalidate().unwrap();
    assert_eq!(pool.live(), 0);
    let lease2 = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
    lease2.release().unwrap();
}

#[test]
fn dropping_a_lease_without_consuming_it_releases_it() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).build();
    {
        let _lease = pool.acquire().unwrap();
    }
    assert_eq!(pool.size(), 1);
    let _lease2 = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 1, "the dropped lease was reused");
}

#[test]
fn use_with_releases_even_though_the_closure_never_saw_release_called() {
    let pool = PoolBuilder::new_infallible(1, || 10u32).build();
    let lease = pool.acquire().unwrap();
    let doubled = lease.use_with(|v| UseOutcome::keep(*v * 2));
    assert_eq!(doubled, 20);
    assert_eq!(pool.size(), 1);
}

#[test]
fn use_with_invalidate_disposes_instead_of_requeuing() {
    let (factory, built) = counted_factory();
    let pool = PoolBuilder::new_infallible(1, factory).build();
    let lease = pool.acquire().unwrap();
    lease.use_with(|_v| UseOutcome::invalidate(()));
    assert_eq!(pool.size(), 0);
    assert_eq!(pool.live(), 0);
    let _lease2 = pool.acquire().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2, "the invalidated value was not reused");
}

#[test]
fn concurrent_acquirers_never_exceed_capacity() {
    let pool = Arc::new(PoolBuilder::new_infallible(4, || 0u32).build());
    let observed_max = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let observed_max = Arc::clone(&observed_max);
            thread::spawn(move || {
                let lease = pool.acquire().unwrap();
                observed_max.fetch_max(pool.leased(), Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                lease.release().unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(observed_max.load(Ordering::SeqCst) <= 4);
    assert_eq!(pool.live(), 4);
}
