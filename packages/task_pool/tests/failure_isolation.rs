//! A failing task only affects its own handle.

use std::fmt::{self, Display};

use task_pool::{Pool, TaskFailure};
use testing::with_watchdog;

#[derive(Debug, PartialEq, Eq)]
struct DivisionByZero;

impl Display for DivisionByZero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempted to divide by zero")
    }
}

impl std::error::Error for DivisionByZero {}

fn divide(dividend: i64, divisor: i64) -> Result<i64, DivisionByZero> {
    dividend.checked_div(divisor).ok_or(DivisionByZero)
}

#[test]
fn returned_error_does_not_affect_siblings() {
    with_watchdog(|| {
        let pool = Pool::new(3).unwrap();

        // Task #5 divides by zero, every other task divides by its own number.
        let handles: Vec<_> = (1..=10_i64)
            .map(|n| {
                let divisor = if n == 5 { 0 } else { n };
                pool.submit_fallible(move || divide(100 * n, divisor))
                    .unwrap()
            })
            .collect();

        for (n, handle) in (1..=10_i64).zip(&handles) {
            if n == 5 {
                let failure = handle.wait().unwrap_err();
                assert_eq!(failure.downcast_ref::<DivisionByZero>(), Some(&DivisionByZero));
            } else {
                assert_eq!(*handle.wait().unwrap(), 100);
            }
        }

        let stats = pool.stats();
        assert_eq!(stats.succeeded(), 9);
        assert_eq!(stats.failed(), 1);
    });
}

#[test]
fn panic_does_not_affect_siblings() {
    with_watchdog(|| {
        let pool = Pool::new(2).unwrap();

        let handles: Vec<_> = (1..=10_u32)
            .map(|n| {
                pool.submit(move || {
                    assert_ne!(n, 5, "task {n} refuses to run");
                    n * 10
                })
                .unwrap()
            })
            .collect();

        for (n, handle) in (1..=10_u32).zip(&handles) {
            match handle.wait() {
                Ok(value) => assert_eq!(*value, n * 10),
                Err(TaskFailure::Panicked { message }) => {
                    assert_eq!(n, 5);
                    assert!(message.contains("refuses to run"));
                }
                Err(other) => panic!("unexpected failure for task {n}: {other}"),
            }
        }

        // The pool is still fully functional afterwards.
        assert_eq!(*pool.submit(|| 1).unwrap().wait().unwrap(), 1);
    });
}

#[test]
fn every_waiter_sees_the_same_failure() {
    with_watchdog(|| {
        let pool = Pool::new(1).unwrap();
        let handle = pool
            .submit_fallible(|| divide(1, 0))
            .unwrap();

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                std::thread::spawn(move || handle.wait().unwrap_err().to_string())
            })
            .collect();

        for waiter in waiters {
            assert!(waiter.join().unwrap().contains("divide by zero"));
        }
    });
}
