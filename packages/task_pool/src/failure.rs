use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Describes why a task did not produce a value.
///
/// Every waiter on the same [`ResultHandle`][crate::ResultHandle] observes the same failure,
/// which is why this type is cheap to clone.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum TaskFailure {
    /// The task panicked while executing on a worker thread.
    #[error("task panicked: {message}")]
    Panicked {
        /// The panic message, if the payload was a string. Otherwise a placeholder.
        message: String,
    },

    /// A fallible task returned an error.
    #[error("task failed: {0}")]
    Errored(#[source] Arc<dyn StdError + Send + Sync + 'static>),

    /// The task was cancelled before any worker claimed it.
    #[error("task was cancelled before it started")]
    Cancelled,

    /// The task was discarded without ever running.
    #[error("task was abandoned without running")]
    Abandoned,
}

impl TaskFailure {
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&'static str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "<non-string panic payload>".to_string()
        };

        Self::Panicked { message }
    }

    pub(crate) fn from_error<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Errored(Arc::new(error))
    }

    /// Returns the error returned by a fallible task, downcast to its concrete type.
    ///
    /// Returns [`None`] if the failure is of a different kind or the error has another type.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::num::ParseIntError;
    ///
    /// use task_pool::Pool;
    ///
    /// let pool = Pool::new(1).unwrap();
    /// let handle = pool.submit_fallible(|| "nope".parse::<i32>()).unwrap();
    ///
    /// let failure = handle.wait().unwrap_err();
    /// assert!(failure.downcast_ref::<ParseIntError>().is_some());
    /// ```
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Self::Errored(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether the task panicked.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// Whether the task was cancelled before it started.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::{self, Debug, Display};
    use std::panic;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(TaskFailure: Send, Sync, Clone, Debug);

    #[derive(Debug)]
    struct Overflow;

    impl Display for Overflow {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "arithmetic overflow")
        }
    }

    impl StdError for Overflow {}

    #[test]
    fn panic_with_static_str_keeps_message() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();

        let failure = TaskFailure::from_panic(payload.as_ref());

        assert!(failure.is_panic());
        assert!(failure.to_string().contains("static message"));
    }

    #[test]
    fn panic_with_formatted_string_keeps_message() {
        let value = 42;
        let payload = panic::catch_unwind(|| panic!("formatted {value}")).unwrap_err();

        let failure = TaskFailure::from_panic(payload.as_ref());

        assert!(failure.to_string().contains("formatted 42"));
    }

    #[test]
    fn panic_with_other_payload_uses_placeholder() {
        let payload = panic::catch_unwind(|| panic::panic_any(7_u32)).unwrap_err();

        let failure = TaskFailure::from_panic(payload.as_ref());

        assert!(failure.to_string().contains("non-string"));
    }

    #[test]
    fn errored_downcasts_to_original_type() {
        let failure = TaskFailure::from_error(Overflow);

        assert!(failure.downcast_ref::<Overflow>().is_some());
        assert!(failure.downcast_ref::<std::fmt::Error>().is_none());
        assert!(!failure.is_panic());
        assert!(!failure.is_cancelled());
    }

    #[test]
    fn clones_share_the_error() {
        let failure = TaskFailure::from_error(Overflow);
        let clone = failure.clone();

        assert_eq!(failure.to_string(), clone.to_string());
    }
}
