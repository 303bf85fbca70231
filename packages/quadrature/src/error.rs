use task_pool::TaskFailure;
use thiserror::Error;

/// Errors that can occur when setting up or running a numerical workload.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The integration range or step size cannot be integrated over.
    #[error("invalid integration range [{start}, {end}] with step {step}: {problem}")]
    InvalidRange {
        /// Lower bound of the range.
        start: f64,

        /// Upper bound of the range.
        end: f64,

        /// Requested maximum step size.
        step: f64,

        /// A human-readable description of the problem.
        problem: &'static str,
    },

    /// The matrix would not fit in memory addressable by this platform.
    #[error("matrix of size {size}x{size} is too large")]
    MatrixTooLarge {
        /// Requested number of rows and columns.
        size: usize,
    },

    /// The pool refused the work.
    #[error(transparent)]
    Pool(#[from] task_pool::Error),

    /// One of the submitted tasks did not produce a value.
    #[error(transparent)]
    Task(#[from] TaskFailure),

    /// A thread that was supposed to deliver a partial result panicked before doing so.
    #[error("worker thread exited without delivering a result")]
    ThreadExited(#[from] oneshot::RecvError),
}

/// A specialized `Result` type for numerical workloads, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
