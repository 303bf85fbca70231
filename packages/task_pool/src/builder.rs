use std::num::NonZero;
use std::thread;

use crate::{Pool, Result};

const DEFAULT_THREAD_NAME_PREFIX: &str = "task-pool-worker";

/// Configures and creates a [`Pool`].
///
/// Obtain one via [`Pool::builder()`].
///
/// # Example
///
/// ```rust
/// use task_pool::Pool;
///
/// let pool = Pool::builder()
///     .worker_count(3)
///     .thread_name_prefix("integrator")
///     .build()
///     .unwrap();
///
/// assert_eq!(pool.worker_count().get(), 3);
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct PoolBuilder {
    worker_count: Option<usize>,
    thread_name_prefix: String,
}

impl PoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            worker_count: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }

    /// Sets the number of worker threads. Must be at least 1.
    ///
    /// If not set, the pool uses one worker per processor available to the process,
    /// as reported by [`std::thread::available_parallelism()`].
    pub fn worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = Some(worker_count);
        self
    }

    /// Sets the prefix of the worker thread names. Each worker is named `<prefix>-<index>`.
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Starts the worker threads and returns the running pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`][crate::Error::Configuration] if the worker count is
    /// zero and [`Error::WorkerSpawn`][crate::Error::WorkerSpawn] if a worker thread could not
    /// be started.
    pub fn build(self) -> Result<Pool> {
        let worker_count = self
            .worker_count
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZero::get));

        Pool::start(worker_count, &self.thread_name_prefix)
    }
}
