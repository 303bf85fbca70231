#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A fixed-size pool of long-lived worker threads that execute submitted closures and report
//! each closure's outcome through a handle the submitter can wait on.
//!
//! The core types are:
//!
//! * [`Pool`] - owns the worker threads and the shared queue. Create one with
//!   [`Pool::new()`] or [`Pool::builder()`].
//! * [`ResultHandle`] - returned by every submission. Blocks in [`ResultHandle::wait()`] until
//!   the task has finished, then yields its value or [`TaskFailure`].
//! * [`TaskQueue`] - the unbounded first-in-first-out queue that feeds the workers, usable on
//!   its own as well.
//! * [`CancellationToken`] - skips tasks that have not started yet.
//!
//! # Example
//!
//! Split a computation into independent tasks and combine the results:
//!
//! ```
//! use task_pool::Pool;
//!
//! let pool = Pool::new(4).unwrap();
//!
//! let handles: Vec<_> = (0..8_u64)
//!     .map(|chunk| {
//!         pool.submit(move || (chunk * 1000..(chunk + 1) * 1000).sum::<u64>())
//!             .unwrap()
//!     })
//!     .collect();
//!
//! let total: u64 = handles.iter().map(|handle| *handle.wait().unwrap()).sum();
//! assert_eq!(total, (0..8000).sum::<u64>());
//! ```
//!
//! # Ordering
//!
//! Tasks are handed to workers in submission order. With more than one worker, tasks run
//! concurrently and may finish in any order, so results should be combined by index or with
//! an order-independent operation.
//!
//! # Failures
//!
//! A task that panics or returns an error resolves its own handle with a [`TaskFailure`].
//! The worker that ran it continues with the next task and other tasks are unaffected.
//!
//! # Shutdown
//!
//! [`Pool::shutdown()`] rejects new submissions with [`Error::Rejected`], lets the workers
//! finish every task already queued and waits for all worker threads to exit. Dropping the
//! pool performs the same shutdown.
//!
//! # Logging
//!
//! The pool emits [`tracing`] events for its lifecycle and for task failures. It never
//! installs a subscriber itself.

mod builder;
mod cancellation;
mod constants;
mod error;
mod failure;
mod handle;
mod pool;
mod queue;
mod stats;
mod worker;

pub use builder::*;
pub use cancellation::*;
pub(crate) use constants::*;
pub use error::*;
pub use failure::*;
pub use handle::ResultHandle;
pub use pool::*;
pub use queue::*;
pub use stats::PoolStats;
