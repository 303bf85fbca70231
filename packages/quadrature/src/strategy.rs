use std::fmt::{self, Display};
use std::num::NonZero;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use task_pool::Pool;

use crate::{IntegralTask, Result};

/// Integrates every task on the calling thread and sums the results in order.
#[must_use]
pub fn sequential(tasks: &[IntegralTask]) -> f64 {
    tasks.iter().map(IntegralTask::compute).sum()
}

/// Submits one pool task per integration task and sums the results.
///
/// The sum is accumulated in submission order, independent of the order in which the pool
/// finishes the tasks.
///
/// # Errors
///
/// Returns an error if the pool rejects a task or a task fails.
pub fn pooled(pool: &Pool, tasks: &[IntegralTask]) -> Result<f64> {
    let handles = tasks
        .iter()
        .map(|&task| pool.submit(move || task.compute()))
        .collect::<task_pool::Result<Vec<_>>>()?;

    handles
        .iter()
        .try_fold(0.0, |sum, handle| Ok(sum + *handle.wait()?))
}

/// Starts one thread per integration task and sums the results in task order.
///
/// # Errors
///
/// Returns [`Error::ThreadExited`][crate::Error::ThreadExited] if a thread panics before
/// delivering its result. Every thread is still waited for before returning.
pub fn thread_per_task(tasks: &[IntegralTask]) -> Result<f64> {
    thread::scope(|s| {
        let pending: Vec<_> = tasks
            .iter()
            .map(|task| {
                let (tx, rx) = oneshot::channel();

                let thread = s.spawn(move || {
                    // The receiver only disappears if the caller already gave up.
                    drop(tx.send(task.compute()));
                });

                (thread, rx)
            })
            .collect();

        let mut sum = 0.0;
        let mut exited = None;

        for (thread, rx) in pending {
            match rx.recv() {
                Ok(value) => sum += value,
                Err(e) => {
                    exited.get_or_insert(e);
                }
            }

            // Joined here so that a panic is reported instead of re-raised by the scope.
            drop(thread.join());
        }

        match exited {
            Some(e) => Err(e.into()),
            None => Ok(sum),
        }
    })
}

/// Starts a fixed set of threads that claim integration tasks through a shared atomic index.
///
/// Every thread writes to the result slot of the task it claimed, so no two threads ever
/// write to the same slot. The slots are summed in order once all threads have finished.
#[must_use]
pub fn shared_index(tasks: &[IntegralTask], threads: NonZero<usize>) -> f64 {
    let next_index = AtomicUsize::new(0);
    let slots: Vec<OnceLock<f64>> = tasks.iter().map(|_| OnceLock::new()).collect();

    thread::scope(|s| {
        for _ in 0..threads.get() {
            s.spawn(|| {
                loop {
                    let index = next_index.fetch_add(1, Ordering::Relaxed);

                    let (Some(task), Some(slot)) = (tasks.get(index), slots.get(index)) else {
                        break;
                    };

                    let previous = slot.set(task.compute());
                    debug_assert!(previous.is_ok(), "index {index} was claimed twice");
                }
            });
        }
    });

    slots
        .into_iter()
        .map(|slot| {
            slot.into_inner()
                .expect("every index below the task count is claimed by exactly one thread")
        })
        .sum()
}

/// How the parallel part of an integration is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub enum Strategy {
    /// Everything on the calling thread.
    Sequential,

    /// One pool task per integration task.
    #[default]
    Pool,

    /// One new thread per integration task.
    ThreadPerTask,

    /// One thread per pool worker, claiming integration tasks through a shared index.
    SharedIndex,
}

impl Strategy {
    /// Every strategy, in a stable order.
    pub const ALL: [Self; 4] = [
        Self::Sequential,
        Self::Pool,
        Self::ThreadPerTask,
        Self::SharedIndex,
    ];

    /// Returns a closure that integrates `tasks` with this strategy when called.
    ///
    /// The pool is used by [`Strategy::Pool`] to run tasks and by [`Strategy::SharedIndex`]
    /// to decide how many threads to start.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::f64::consts::PI;
    /// use std::num::NonZero;
    ///
    /// use quadrature::{Strategy, partition};
    /// use task_pool::Pool;
    ///
    /// let pool = Pool::new(2).unwrap();
    /// let tasks = partition(0.0, PI, 1e-4, NonZero::new(8).unwrap(), f64::sin).unwrap();
    ///
    /// let integrate = Strategy::Pool.integrator(&pool, &tasks);
    /// assert!((integrate().unwrap() - 2.0).abs() < 1e-6);
    /// ```
    pub fn integrator<'a>(
        self,
        pool: &'a Pool,
        tasks: &'a [IntegralTask],
    ) -> Box<dyn FnOnce() -> Result<f64> + 'a> {
        match self {
            Self::Sequential => Box::new(move || Ok(sequential(tasks))),
            Self::Pool => Box::new(move || pooled(pool, tasks)),
            Self::ThreadPerTask => Box::new(move || thread_per_task(tasks)),
            Self::SharedIndex => {
                Box::new(move || Ok(shared_index(tasks, pool.worker_count())))
            }
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sequential => "sequential",
            Self::Pool => "pool",
            Self::ThreadPerTask => "thread-per-task",
            Self::SharedIndex => "shared-index",
        };

        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.to_string() == s)
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Returned when parsing a [`Strategy`] from an unrecognized name.
#[derive(Debug, thiserror::Error)]
#[error("unknown strategy '{0}', expected one of: sequential, pool, thread-per-task, shared-index")]
pub struct UnknownStrategy(String);
