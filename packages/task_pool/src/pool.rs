use std::error::Error as StdError;
use std::mem;
use std::num::NonZero;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, info, trace, warn};

use crate::handle::result_channel;
use crate::stats::Counters;
use crate::worker::{Job, spawn_worker};
use crate::{
    CancellationToken, ERR_POISONED_LOCK, Error, PoolBuilder, PoolStats, Result, ResultHandle,
    TaskFailure, TaskQueue,
};

/// Lifecycle state of a [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolState {
    /// The pool accepts new tasks.
    Running,

    /// Shutdown has begun. New tasks are rejected while the workers finish the queued ones.
    Draining,

    /// Every worker has exited.
    Stopped,
}

/// A fixed set of worker threads that execute submitted tasks in submission order.
///
/// Each call to [`submit()`][Self::submit] returns a [`ResultHandle`] immediately. The task is
/// appended to a shared first-in-first-out queue and the first idle worker picks it up. With
/// more than one worker, tasks may finish in any order.
///
/// A task that panics or returns an error only affects its own handle. The worker that ran it
/// moves on to the next task.
///
/// # Example
///
/// ```rust
/// use task_pool::Pool;
///
/// let pool = Pool::new(4).unwrap();
///
/// let handles: Vec<_> = (1..=10_u64)
///     .map(|n| pool.submit(move || n * n).unwrap())
///     .collect();
///
/// let sum: u64 = handles.iter().map(|h| *h.wait().unwrap()).sum();
/// assert_eq!(sum, 385);
/// ```
///
/// # Lifecycle
///
/// [`shutdown()`][Self::shutdown] stops accepting tasks, lets the workers drain the queue and
/// waits for every worker thread to exit. Dropping the pool does the same, so worker threads
/// never outlive the pool.
#[derive(Debug)]
pub struct Pool {
    queue: Arc<TaskQueue<Job>>,
    counters: Arc<Counters>,

    // Emptied by the first shutdown. Held for the duration of the joins so that a concurrent
    // shutdown call only returns once the pool has actually stopped.
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_ids: Box<[ThreadId]>,

    worker_count: NonZero<usize>,
    stopped: AtomicBool,
}

impl Pool {
    /// Creates a pool with the given number of worker threads.
    ///
    /// Use [`builder()`][Self::builder] for more configuration options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `worker_count` is zero and [`Error::WorkerSpawn`]
    /// if a worker thread could not be started.
    pub fn new(worker_count: usize) -> Result<Self> {
        Self::builder().worker_count(worker_count).build()
    }

    /// Starts configuring a new pool.
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    pub(crate) fn start(worker_count: usize, thread_name_prefix: &str) -> Result<Self> {
        let Some(worker_count) = NonZero::new(worker_count) else {
            return Err(Error::Configuration {
                problem: "worker count must be at least 1".to_string(),
            });
        };

        let queue = Arc::new(TaskQueue::new());
        let counters = Arc::new(Counters::default());
        let mut workers = Vec::with_capacity(worker_count.get());

        for index in 0..worker_count.get() {
            match spawn_worker(
                index,
                format!("{thread_name_prefix}-{index}"),
                Arc::clone(&queue),
                Arc::clone(&counters),
            ) {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    stop_partially_started(&queue, workers);

                    return Err(Error::WorkerSpawn {
                        worker_index: index,
                        source,
                    });
                }
            }
        }

        info!(workers = worker_count.get(), "task pool started");

        Ok(Self {
            queue,
            counters,
            worker_ids: workers.iter().map(|worker| worker.thread().id()).collect(),
            workers: Mutex::new(workers),
            worker_count,
            stopped: AtomicBool::new(false),
        })
    }

    /// Submits a task and returns a handle to its eventual result.
    ///
    /// This never blocks beyond briefly locking the queue. If the task panics, the panic is
    /// captured and delivered through the handle as [`TaskFailure::Panicked`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if shutdown has begun. The task is dropped without running.
    pub fn submit<F, T>(&self, task: F) -> Result<ResultHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + Sync + 'static,
    {
        self.enqueue(move || Ok(task()), None)
    }

    /// Submits a task that can fail and returns a handle to its eventual result.
    ///
    /// An error returned by the task is delivered through the handle as
    /// [`TaskFailure::Errored`] and can be recovered via [`TaskFailure::downcast_ref()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if shutdown has begun. The task is dropped without running.
    pub fn submit_fallible<F, T, E>(&self, task: F) -> Result<ResultHandle<T>>
    where
        F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
        T: Send + Sync + 'static,
        E: StdError + Send + Sync + 'static,
    {
        self.enqueue(move || task().map_err(TaskFailure::from_error), None)
    }

    /// Submits a task that is skipped if `token` is cancelled before a worker claims it.
    ///
    /// A skipped task resolves its handle with [`TaskFailure::Cancelled`]. Once a worker has
    /// started the task, cancelling the token has no effect on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if shutdown has begun. The task is dropped without running.
    ///
    /// # Example
    ///
    /// ```rust
    /// use task_pool::{CancellationToken, Pool};
    ///
    /// let pool = Pool::new(1).unwrap();
    /// let token = CancellationToken::new();
    ///
    /// token.cancel();
    /// let handle = pool.submit_cancellable(&token, || 1).unwrap();
    ///
    /// assert!(handle.wait().unwrap_err().is_cancelled());
    /// ```
    pub fn submit_cancellable<F, T>(
        &self,
        token: &CancellationToken,
        task: F,
    ) -> Result<ResultHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + Sync + 'static,
    {
        self.enqueue(move || Ok(task()), Some(token.clone()))
    }

    fn enqueue<F, T>(
        &self,
        work: F,
        cancellation: Option<CancellationToken>,
    ) -> Result<ResultHandle<T>>
    where
        F: FnOnce() -> std::result::Result<T, TaskFailure> + Send + 'static,
        T: Send + Sync + 'static,
    {
        let (resolver, handle) = result_channel();

        // Counted before the handoff so that a fast worker never finishes a task that has
        // not been counted as submitted yet.
        self.counters.record_submitted();

        if let Err(rejected) = self.queue.enqueue(Job::new(work, resolver, cancellation)) {
            self.counters.record_rejected();
            drop(rejected);
            return Err(Error::Rejected);
        }

        trace!(queued = self.queue.len(), "task submitted");

        Ok(handle)
    }

    /// Stops accepting tasks, waits for the queued tasks to finish and for every worker thread
    /// to exit.
    ///
    /// Calling this more than once is harmless. Every call made outside the pool's worker
    /// threads returns only after the pool has stopped.
    ///
    /// If called from one of the pool's own worker threads (for example because a task drops
    /// the last reference to the pool), the call only closes the queue and returns. The pool
    /// stays [`PoolState::Draining`] until a call from another thread, or dropping the pool on
    /// another thread, waits for the workers. Workers still exit on their own once the queue is
    /// drained.
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    pub fn shutdown(&self) {
        if self.queue.close() {
            info!(
                queued = self.queue.len(),
                "task pool draining, no new tasks accepted"
            );
        }

        if self.is_own_worker() {
            // Waiting here would mean this worker waits for itself to exit.
            debug!("shutdown requested from a worker thread, leaving the joins to another caller");
            return;
        }

        let mut workers = self.workers.lock().expect(ERR_POISONED_LOCK);

        if workers.is_empty() {
            return;
        }

        join_all(mem::take(&mut *workers));

        self.stopped.store(true, Ordering::Release);

        info!("task pool stopped");
    }

    fn is_own_worker(&self) -> bool {
        self.worker_ids.contains(&thread::current().id())
    }

    /// The current lifecycle state of the pool.
    #[must_use]
    pub fn state(&self) -> PoolState {
        if !self.queue.is_closed() {
            PoolState::Running
        } else if self.stopped.load(Ordering::Acquire) {
            PoolState::Stopped
        } else {
            PoolState::Draining
        }
    }

    /// The number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> NonZero<usize> {
        self.worker_count
    }

    /// The number of tasks waiting for a worker.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// A snapshot of the task counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }
}

impl Drop for Pool {
    #[cfg_attr(test, mutants::skip)] // Impractical to test that stuff stops happening.
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Undoes a start-up that failed after some workers were already running.
fn stop_partially_started(queue: &TaskQueue<Job>, workers: Vec<JoinHandle<()>>) {
    // Nothing was submitted yet, so the workers exit as soon as they see the queue closed.
    queue.close();
    join_all(workers);
}

/// Must not be called from one of the workers being joined.
fn join_all(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        // Tasks cannot unwind out of a worker, so this only happens if the pool itself panicked.
        if worker.join().is_err() {
            warn!("worker thread terminated with a panic");
        }
    }
}
