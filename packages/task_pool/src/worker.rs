use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};

use crate::handle::Resolver;
use crate::stats::Counters;
use crate::{CancellationToken, TaskFailure, TaskQueue};

/// A type-erased unit of work in the queue, together with the optional token that can cancel
/// it before a worker claims it.
pub(crate) struct Job {
    task: Box<dyn Runnable>,
    cancellation: Option<CancellationToken>,
}

impl Job {
    pub(crate) fn new<F, T>(
        work: F,
        resolver: Resolver<T>,
        cancellation: Option<CancellationToken>,
    ) -> Self
    where
        F: FnOnce() -> Result<T, TaskFailure> + Send + 'static,
        T: Send + Sync + 'static,
    {
        Self {
            task: Box::new(TypedTask { work, resolver }),
            cancellation,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("cancellable", &self.cancellation.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Completion {
    Succeeded,
    Failed,
}

/// Erases the result type of a task so that tasks of different types can share one queue.
trait Runnable: Send {
    /// Executes the task and deposits its outcome into the paired result handle.
    fn run(self: Box<Self>) -> Completion;

    /// Skips the task, resolving the paired result handle as cancelled.
    fn cancel(self: Box<Self>);
}

struct TypedTask<F, T> {
    work: F,
    resolver: Resolver<T>,
}

impl<F, T> Runnable for TypedTask<F, T>
where
    F: FnOnce() -> Result<T, TaskFailure> + Send,
    T: Send + Sync,
{
    fn run(self: Box<Self>) -> Completion {
        let Self { work, resolver } = *self;

        // The closure is consumed by the call, so nothing observes its state after a panic.
        let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let failure = TaskFailure::from_panic(payload.as_ref());
                warn!(%failure, "task panicked");
                Err(failure)
            }
        };

        let completion = match &outcome {
            Ok(_) => Completion::Succeeded,
            Err(failure) => {
                debug!(%failure, "task failed");
                Completion::Failed
            }
        };

        deposit(resolver, outcome);

        completion
    }

    fn cancel(self: Box<Self>) {
        deposit(self.resolver, Err(TaskFailure::Cancelled));
    }
}

fn deposit<T>(resolver: Resolver<T>, outcome: Result<T, TaskFailure>) {
    if let Err(e) = resolver.resolve(outcome) {
        // Each job owns the only resolver for its handle, so this means the pool is broken.
        error!(error = %e, "task outcome could not be delivered");

        #[cfg(debug_assertions)]
        panic!("task outcome could not be delivered: {e}");
    }
}

/// Starts a worker thread that serves the queue until it is closed and empty.
pub(crate) fn spawn_worker(
    index: usize,
    thread_name: String,
    queue: Arc<TaskQueue<Job>>,
    counters: Arc<Counters>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(thread_name)
        .spawn(move || worker_entrypoint(index, &queue, &counters))
}

#[cfg_attr(test, mutants::skip)] // Impractical to test that things do not happen when the loop is missing.
fn worker_entrypoint(index: usize, queue: &TaskQueue<Job>, counters: &Counters) {
    debug!(worker = index, "worker started");

    while let Some(job) = queue.dequeue() {
        if job.is_cancelled() {
            trace!(worker = index, "skipping cancelled task");
            job.task.cancel();
            counters.record_cancelled();
            continue;
        }

        trace!(worker = index, "running task");

        match job.task.run() {
            Completion::Succeeded => counters.record_succeeded(),
            Completion::Failed => counters.record_failed(),
        }
    }

    debug!(worker = index, "queue closed and drained, worker exiting");
}
