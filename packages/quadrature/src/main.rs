#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))]

//! Compares sequential and parallel trapezoidal integration of `sin(x)` over `[0, π]` and,
//! optionally, sequential and pooled matrix-vector multiplication in both matrix layouts.
//!
//! Set `RUST_LOG=debug` to see the pool lifecycle and the individual integration tasks.

use std::f64::consts::PI;
use std::num::NonZero;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use argh::FromArgs;
use quadrature::{
    Decomposition, IntegralTask, Layout, MatrixVector, Strategy, matches_reference, partition,
};
use task_pool::Pool;
use tracing_subscriber::EnvFilter;

/// Compare sequential and parallel execution of numerical workloads on a worker pool.
#[derive(FromArgs)]
struct Args {
    /// number of pool worker threads (default: available parallelism)
    #[argh(option)]
    threads: Option<usize>,

    /// number of sub-intervals the integration range is split into
    #[argh(option, default = "30")]
    tasks: usize,

    /// maximum integration step width
    #[argh(option, default = "1e-5")]
    step: f64,

    /// parallel strategy: sequential, pool, thread-per-task or shared-index
    #[argh(option, default = "Strategy::Pool")]
    strategy: Strategy,

    /// also multiply a matrix of this size by a vector, sequentially and on the pool
    #[argh(option)]
    matrix_size: Option<usize>,

    /// rows or columns per pool task for the matrix-vector product
    #[argh(option, default = "64")]
    block_size: usize,
}

// Binary entry point - mutations would require subprocess testing which is impractical.
#[cfg_attr(test, mutants::skip)]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg_attr(test, mutants::skip)]
fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let threads = args
        .threads
        .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZero::get));
    let parts = NonZero::new(args.tasks).ok_or("--tasks must be at least 1")?;
    let block_size = NonZero::new(args.block_size).ok_or("--block-size must be at least 1")?;

    let pool = Pool::builder()
        .worker_count(threads)
        .thread_name_prefix("quadrature")
        .build()?;

    let whole = IntegralTask::new(0.0, PI, args.step, f64::sin)?;

    let started = Instant::now();
    let sequential = whole.compute();
    let sequential_elapsed = started.elapsed();

    println!(
        "Sequential integral: {sequential} (time: {:.6} s)",
        sequential_elapsed.as_secs_f64()
    );

    let tasks = partition(0.0, PI, args.step, parts, f64::sin)?;
    let integrate = args.strategy.integrator(&pool, &tasks);

    let started = Instant::now();
    let parallel = integrate()?;
    let parallel_elapsed = started.elapsed();

    println!(
        "Parallel integral ({}): {parallel} (threads: {threads}, tasks: {parts}, time: {:.6} s)",
        args.strategy,
        parallel_elapsed.as_secs_f64()
    );

    if let Some(size) = args.matrix_size {
        let size = NonZero::new(size).ok_or("--matrix-size must be at least 1")?;
        compare_matrix_vector(&pool, size, block_size)?;
    }

    pool.shutdown();

    Ok(())
}

#[cfg_attr(test, mutants::skip)]
fn compare_matrix_vector(
    pool: &Pool,
    size: NonZero<usize>,
    block_size: NonZero<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let problem = MatrixVector::new(size)?;

    for layout in Layout::ALL {
        println!("\n{layout}:");

        let started = Instant::now();
        let reference = problem.reference(layout);
        report("sequential", &problem, started.elapsed().as_secs_f64(), true);

        for decomposition in Decomposition::ALL {
            let started = Instant::now();
            let parallel = problem.multiply_pooled(pool, layout, decomposition, block_size)?;
            let elapsed = started.elapsed().as_secs_f64();

            report(
                &format!("pooled, {decomposition}"),
                &problem,
                elapsed,
                matches_reference(&parallel, &reference),
            );
        }
    }

    Ok(())
}

fn report(name: &str, problem: &MatrixVector, seconds: f64, correct: bool) {
    let gflops = problem.flop_count() / seconds * 1e-9;
    let gbs = problem.matrix_bytes() / seconds * 1e-9;
    let verdict = if correct { "correct result" } else { "WRONG RESULT" };

    println!("{name} | time: {seconds:.6} s | {gflops:.6} GFLOP/s | {gbs:.6} GB/s | {verdict}");
}
