// A pool of reusable scratch buffers shared by a handful of worker threads.
//
// Each worker acquires a buffer, fills it with its own output, sends the
// finished buffer's contents down a channel, and releases the buffer back
// to the pool instead of letting it (and its allocation) drop.

use leasepool::PoolBuilder;
use std::sync::mpsc;
use std::thread;

fn main() {
    let pool = PoolBuilder::new_infallible(4, String::new)
        .reset(|s| s.clear())
        .build();

    let (tx, rx) = mpsc::channel();
    let mut workers = Vec::new();
    for worker_id in 0..8 {
        let pool = pool.clone();
        let tx = tx.clone();
        workers.push(thread::spawn(move || {
            use std::fmt::Write;
            let mut lease = pool.acquire().expect("pool is not closed");
            write!(lease.get_mut().unwrap(), "worker {worker_id} finished").unwrap();
            tx.send(lease.get().unwrap().clone()).unwrap();
            lease.release().unwrap();
        }));
    }
    drop(tx);
    for w in workers {
        w.join().unwrap();
    }
    let mut messages: Vec<_> = rx.iter().collect();
    messages.sort();
    for message in messages {
        println!("{message}");
    }
    println!("buffers built: {}", pool.live());
}
