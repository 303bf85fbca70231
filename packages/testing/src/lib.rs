#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for tests, examples and benchmarks in this workspace.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// How long a test may run before [`with_watchdog()`] declares it hung.
pub const WATCHDOG_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a test body on a separate thread and fails the test if it does not finish within
/// [`WATCHDOG_TIMEOUT`].
///
/// Thread pool tests that go wrong tend to deadlock rather than fail. The watchdog turns such
/// a deadlock into a test failure instead of a hung test run.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the body runs directly on
/// the calling thread so that the mutation testing tool can detect hangs itself.
///
/// # Panics
///
/// Panics if the body panics or exceeds the timeout.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let value = with_watchdog(|| 2 + 2);
/// assert_eq!(value, 4);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    with_watchdog_timeout(WATCHDOG_TIMEOUT, test_fn)
}

/// Same as [`with_watchdog()`] but with a caller-chosen timeout.
///
/// # Panics
///
/// Panics if the body panics or exceeds the timeout.
pub fn with_watchdog_timeout<F, R>(timeout: Duration, test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        let result = test_fn();
        // The receiver is gone if the watchdog already gave up on us.
        drop(tx.send(result));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread.join().expect("test thread sent a result, so it did not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not finish within {timeout:?} - probable deadlock");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without sending a result"),
            Err(payload) => std::panic::resume_unwind(payload),
        },
    }
}

/// Returns the relative difference between `actual` and `expected`, or 0.0 if it does not
/// exceed `tolerance`.
///
/// Comparing against 0.0 with `assert_eq!` keeps the actual difference visible in the
/// assertion message when the check fails.
///
/// # Example
///
/// ```rust
/// use testing::relative_diff;
///
/// assert_eq!(relative_diff(1.000_000_1, 1.0, 1e-6), 0.0);
/// assert!(relative_diff(1.1, 1.0, 1e-6) > 0.0);
/// ```
#[must_use]
pub fn relative_diff(actual: f64, expected: f64, tolerance: f64) -> f64 {
    let scale = expected.abs().max(f64::MIN_POSITIVE);
    let diff = (actual - expected).abs() / scale;

    if diff <= tolerance { 0.0 } else { diff }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn watchdog_returns_body_result() {
        assert_eq!(with_watchdog(|| 42), 42);
    }

    #[test]
    #[should_panic(expected = "probable deadlock")]
    fn watchdog_catches_hang() {
        with_watchdog_timeout(Duration::from_millis(10), || {
            thread::sleep(Duration::from_secs(5));
        });
    }

    #[test]
    #[should_panic(expected = "inner failure")]
    fn watchdog_propagates_panic() {
        with_watchdog(|| panic!("inner failure"));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "relative_diff returns exactly 0.0 when within tolerance")]
    fn relative_diff_within_tolerance_is_zero() {
        assert_eq!(relative_diff(100.0, 100.000_01, 1e-6), 0.0);
        assert_eq!(relative_diff(-2.0, -2.0, 0.0), 0.0);
    }

    #[test]
    fn relative_diff_reports_excess() {
        let diff = relative_diff(110.0, 100.0, 1e-6);

        assert!((diff - 0.1).abs() < 1e-12);
    }
}
