//! Fans out independent pieces of work to a pool and combines the results.

use std::thread;
use std::time::Duration;

use task_pool::{Pool, TaskFailure};

fn main() {
    let pool = Pool::builder()
        .worker_count(4)
        .thread_name_prefix("example")
        .build()
        .expect("4 workers is a valid configuration");

    println!("Started a pool with {} workers", pool.worker_count());

    // Each task sums one block of numbers. Results are combined by index.
    let handles: Vec<_> = (0..8_u64)
        .map(|block| {
            pool.submit(move || {
                thread::sleep(Duration::from_millis(10));
                (block * 100..(block + 1) * 100).sum::<u64>()
            })
            .expect("pool is running")
        })
        .collect();

    for (block, handle) in handles.iter().enumerate() {
        println!("Block {block}: {}", handle.wait().expect("block sums cannot fail"));
    }

    let total: u64 = handles.iter().map(|h| *h.wait().expect("checked above")).sum();
    println!("Total: {total}");

    // Failures are delivered to the waiter instead of tearing down the worker.
    let failing = pool
        .submit_fallible(|| "not a number".parse::<u32>())
        .expect("pool is running");

    match failing.wait() {
        Ok(value) => println!("Unexpectedly parsed {value}"),
        Err(TaskFailure::Errored(e)) => println!("Task failed as expected: {e}"),
        Err(other) => println!("Task failed in an unexpected way: {other}"),
    }

    pool.shutdown();
    println!("Pool state after shutdown: {:?}", pool.state());
    println!("Stats: {:?}", pool.stats());
}
