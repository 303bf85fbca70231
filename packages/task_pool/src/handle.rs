use std::fmt;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::time::Duration;

use tracing::error;

use crate::{ERR_POISONED_LOCK, Error, Result, TaskFailure};

type Outcome<T> = std::result::Result<T, TaskFailure>;

/// Creates a connected resolver-handle pair for one task.
pub(crate) fn result_channel<T>() -> (Resolver<T>, ResultHandle<T>) {
    let cell = Arc::new(ResultCell::new());

    (
        Resolver {
            cell: Some(Arc::clone(&cell)),
        },
        ResultHandle { cell },
    )
}

/// The single-assignment cell shared by a [`Resolver`] and any number of [`ResultHandle`]s.
struct ResultCell<T> {
    outcome: OnceLock<Outcome<T>>,

    // The outcome itself is lock-free to read once set. The lock only exists to pair with the
    // condition variable so that a waiter cannot miss the notification between checking the
    // outcome and going to sleep.
    lock: Mutex<()>,
    resolved: Condvar,
}

impl<T> ResultCell<T> {
    fn new() -> Self {
        Self {
            outcome: OnceLock::new(),
            lock: Mutex::new(()),
            resolved: Condvar::new(),
        }
    }

    fn resolve(&self, outcome: Outcome<T>) -> Result<()> {
        {
            let _guard = self.lock.lock().expect(ERR_POISONED_LOCK);

            if self.outcome.set(outcome).is_err() {
                return Err(Error::DoubleResolution);
            }
        }

        self.resolved.notify_all();

        Ok(())
    }

    fn wait(&self) -> &Outcome<T> {
        if let Some(outcome) = self.outcome.get() {
            return outcome;
        }

        let guard = self.lock.lock().expect(ERR_POISONED_LOCK);
        let _guard = self
            .resolved
            .wait_while(guard, |_| self.outcome.get().is_none())
            .expect(ERR_POISONED_LOCK);

        self.outcome
            .get()
            .expect("wait_while only returns once the outcome is set")
    }

    fn wait_timeout(&self, timeout: Duration) -> Option<&Outcome<T>> {
        if let Some(outcome) = self.outcome.get() {
            return Some(outcome);
        }

        let guard = self.lock.lock().expect(ERR_POISONED_LOCK);
        let (_guard, _) = self
            .resolved
            .wait_timeout_while(guard, timeout, |_| self.outcome.get().is_none())
            .expect(ERR_POISONED_LOCK);

        self.outcome.get()
    }
}

/// The write side of a task's result. Owned by the queued job and consumed when the worker
/// deposits the outcome.
///
/// If dropped without resolving, the paired handle is resolved with
/// [`TaskFailure::Abandoned`] so that waiters are released.
pub(crate) struct Resolver<T> {
    // Only `None` after `resolve()` has taken it, which consumes `self`.
    cell: Option<Arc<ResultCell<T>>>,
}

impl<T> Resolver<T> {
    pub(crate) fn resolve(mut self, outcome: Outcome<T>) -> Result<()> {
        let cell = self
            .cell
            .take()
            .expect("resolver cell is only taken by resolve(), which consumes the resolver");

        cell.resolve(outcome)
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        let Some(cell) = self.cell.take() else {
            return;
        };

        if let Err(e) = cell.resolve(Err(TaskFailure::Abandoned)) {
            error!(error = %e, "abandoned task had already been resolved");
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("pending", &self.cell.is_some())
            .finish()
    }
}

/// A handle to the eventual outcome of a task submitted to a [`Pool`][crate::Pool].
///
/// The handle is resolved exactly once, by the worker that executed the task. Until then,
/// [`wait()`][Self::wait] blocks the calling thread.
///
/// Handles can be cloned and shared between threads. Every clone observes the same outcome
/// and waiting is idempotent: once resolved, every call returns the same value or failure.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use task_pool::Pool;
///
/// let pool = Pool::new(2).unwrap();
/// let handle = pool.submit(|| 6 * 7).unwrap();
///
/// let observer = thread::spawn({
///     let handle = handle.clone();
///     move || *handle.wait().unwrap()
/// });
///
/// assert_eq!(*handle.wait().unwrap(), 42);
/// assert_eq!(observer.join().unwrap(), 42);
/// ```
pub struct ResultHandle<T> {
    cell: Arc<ResultCell<T>>,
}

impl<T> ResultHandle<T> {
    /// Blocks until the task has finished and returns a reference to its value.
    ///
    /// # Errors
    ///
    /// Returns the [`TaskFailure`] captured when the task panicked, returned an error, was
    /// cancelled or was abandoned.
    pub fn wait(&self) -> std::result::Result<&T, TaskFailure> {
        self.cell.wait().as_ref().map_err(TaskFailure::clone)
    }

    /// Blocks until the task has finished or the timeout elapses.
    ///
    /// Returns [`None`] if the task was still unresolved when the timeout elapsed.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<std::result::Result<&T, TaskFailure>> {
        self.cell
            .wait_timeout(timeout)
            .map(|outcome| outcome.as_ref().map_err(TaskFailure::clone))
    }

    /// Returns the outcome if the task has already finished, without blocking.
    #[must_use]
    pub fn try_get(&self) -> Option<std::result::Result<&T, TaskFailure>> {
        self.cell
            .outcome
            .get()
            .map(|outcome| outcome.as_ref().map_err(TaskFailure::clone))
    }

    /// Whether the task has finished, successfully or not.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.cell.outcome.get().is_some()
    }

    /// Blocks until the task has finished and returns its value by value.
    ///
    /// If this is the last handle to the task's result, the value is moved out. Otherwise it
    /// is cloned, leaving the other handles unaffected.
    ///
    /// # Errors
    ///
    /// Returns the [`TaskFailure`] captured when the task did not produce a value.
    pub fn into_result(self) -> std::result::Result<T, TaskFailure>
    where
        T: Clone,
    {
        // Ensures the outcome is present before we try to take it.
        self.cell.wait();

        match Arc::try_unwrap(self.cell) {
            Ok(cell) => cell
                .outcome
                .into_inner()
                .expect("outcome was set before we took ownership of the cell"),
            Err(cell) => cell.wait().clone(),
        }
    }
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::thread;

    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(ResultHandle<u64>: Send, Sync, Clone);
    assert_impl_all!(Resolver<u64>: Send);
    assert_not_impl_any!(Resolver<u64>: Clone);

    #[test]
    fn resolved_value_is_visible_to_every_clone() {
        let (resolver, handle) = result_channel::<String>();
        let clone = handle.clone();

        assert!(!handle.is_resolved());
        assert!(handle.try_get().is_none());

        resolver.resolve(Ok("done".to_string())).unwrap();

        assert_eq!(handle.wait().unwrap(), "done");
        assert_eq!(clone.wait().unwrap(), "done");
        assert_eq!(handle.try_get().unwrap().unwrap(), "done");
    }

    #[test]
    fn wait_is_idempotent_for_failures() {
        let (resolver, handle) = result_channel::<u32>();

        resolver.resolve(Err(TaskFailure::Cancelled)).unwrap();

        assert!(handle.wait().unwrap_err().is_cancelled());
        assert!(handle.wait().unwrap_err().is_cancelled());
    }

    #[test]
    fn second_resolution_is_detected() {
        let cell = ResultCell::new();

        cell.resolve(Ok(1)).unwrap();
        let second = cell.resolve(Ok(2));

        assert!(matches!(second, Err(Error::DoubleResolution)));
        assert_eq!(*cell.wait().as_ref().unwrap(), 1);
    }

    #[test]
    fn dropped_resolver_abandons_task() {
        let (resolver, handle) = result_channel::<u32>();

        drop(resolver);

        assert!(matches!(handle.wait(), Err(TaskFailure::Abandoned)));
    }

    #[test]
    fn wait_timeout_returns_none_while_pending() {
        let (resolver, handle) = result_channel::<u32>();

        assert!(handle.wait_timeout(Duration::from_millis(10)).is_none());

        resolver.resolve(Ok(5)).unwrap();

        assert_eq!(
            *handle
                .wait_timeout(Duration::from_millis(10))
                .unwrap()
                .unwrap(),
            5
        );
    }

    #[test]
    fn many_waiters_are_all_released() {
        with_watchdog(|| {
            let (resolver, handle) = result_channel::<u64>();

            let waiters: Vec<_> = (0..8)
                .map(|_| {
                    let handle = handle.clone();
                    thread::spawn(move || *handle.wait().unwrap())
                })
                .collect();

            thread::sleep(Duration::from_millis(20));
            resolver.resolve(Ok(1234)).unwrap();

            for waiter in waiters {
                assert_eq!(waiter.join().unwrap(), 1234);
            }
        });
    }

    #[test]
    fn into_result_moves_or_clones() {
        let (resolver, handle) = result_channel::<Vec<u8>>();
        let clone = handle.clone();
        resolver.resolve(Ok(vec![1, 2, 3])).unwrap();

        // Another handle still exists, so this clones.
        assert_eq!(handle.into_result().unwrap(), vec![1, 2, 3]);

        // Last handle, so this moves.
        assert_eq!(clone.into_result().unwrap(), vec![1, 2, 3]);
    }
}
