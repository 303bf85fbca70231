//! Compares the execution strategies for a partitioned integration.

#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::f64::consts::PI;
use std::hint::black_box;
use std::num::NonZero;
use std::thread;

use criterion::{Criterion, criterion_group, criterion_main};
use quadrature::{Strategy, partition};
use task_pool::Pool;

criterion_group!(benches, entrypoint);
criterion_main!(benches);

// Coarser than the CLI default so that a single iteration stays in the millisecond range.
const STEP: f64 = 1e-4;
const PARTS: usize = 30;

fn entrypoint(c: &mut Criterion) {
    let workers = thread::available_parallelism().map_or(1, NonZero::get);
    let pool = Pool::new(workers).unwrap();
    let tasks = partition(0.0, PI, STEP, NonZero::new(PARTS).unwrap(), f64::sin).unwrap();

    let mut group = c.benchmark_group("quad_sine");

    for strategy in Strategy::ALL {
        group.bench_function(strategy.to_string(), |b| {
            b.iter(|| black_box(strategy.integrator(&pool, &tasks)().unwrap()));
        });
    }

    group.finish();
}
