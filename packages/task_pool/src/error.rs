use std::io;

use thiserror::Error;

/// Errors returned by pool construction and task submission.
///
/// Failures of the tasks themselves are not reported through this type. They are delivered
/// to whoever waits on the task's [`ResultHandle`][crate::ResultHandle] as a
/// [`TaskFailure`][crate::TaskFailure].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The pool was configured with parameters it cannot operate with.
    #[error("invalid pool configuration: {problem}")]
    Configuration {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread {worker_index}")]
    WorkerSpawn {
        /// Zero-based index of the worker that could not be started.
        worker_index: usize,

        /// The underlying error reported by the operating system.
        #[source]
        source: io::Error,
    },

    /// A task was submitted after the pool started shutting down. The task was not queued.
    #[error("task rejected because the pool is shutting down or stopped")]
    Rejected,

    /// A result handle was resolved more than once.
    ///
    /// This indicates a defect in the pool itself and is never expected in a correct program.
    #[error("result handle was already resolved")]
    DoubleResolution,
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
