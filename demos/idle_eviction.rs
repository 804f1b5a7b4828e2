// A pool that drops idle connections after a short timeout instead of
// holding them open forever, using the expiring pool variant.

use leasepool::PoolBuilder;
use std::time::Duration;

#[derive(Debug)]
struct Connection(u32);

fn main() {
    let next_id = std::sync::atomic::AtomicU32::new(0);
    let pool = PoolBuilder::new_infallible(4, move || {
        Connection(next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst))
    })
    .max_idle_time(Duration::from_millis(200))
    .dispose(|conn| println!("closing {conn:?}"))
    .build();

    let lease = pool.acquire().unwrap();
    println!("using {:?}", lease.get().unwrap());
    lease.release().unwrap();
    println!("idle: {}, live: {}", pool.size(), pool.live());

    std::thread::sleep(Duration::from_millis(500));
    println!("after the idle timeout, live: {}", pool.live());
}
