//! Shutdown drains queued work, rejects new work and can safely be requested more than once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use task_pool::{Error, Pool, PoolState};
use testing::with_watchdog;

/// Holds workers inside a task until opened.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

impl Gate {
    fn wait(&self) {
        let open = self.open.lock().unwrap();
        drop(self.opened.wait_while(open, |open| !*open).unwrap());
    }

    fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

#[test]
fn queued_tasks_finish_before_workers_exit() {
    with_watchdog(|| {
        const QUEUED: usize = 50;

        let pool = Arc::new(Pool::new(1).unwrap());
        let gate = Arc::new(Gate::default());
        let started = Arc::new(Barrier::new(2));

        let blocker = pool
            .submit({
                let gate = Arc::clone(&gate);
                let started = Arc::clone(&started);
                move || {
                    started.wait();
                    gate.wait();
                }
            })
            .unwrap();

        // From here on the only worker is busy, so everything else stays queued.
        started.wait();

        let queued: Vec<_> = (0..QUEUED)
            .map(|i| pool.submit(move || i + 1).unwrap())
            .collect();

        let shutdown = thread::spawn({
            let pool = Arc::clone(&pool);
            move || pool.shutdown()
        });

        while pool.state() == PoolState::Running {
            thread::sleep(Duration::from_millis(1));
        }

        // The worker is still held by the gate, so nothing queued has been claimed yet.
        assert!(matches!(pool.submit(|| 0), Err(Error::Rejected)));
        assert_eq!(pool.queued_len(), QUEUED);
        assert!(queued.iter().all(|handle| !handle.is_resolved()));

        gate.open();
        shutdown.join().unwrap();

        assert_eq!(pool.state(), PoolState::Stopped);
        blocker.wait().unwrap();

        for (i, handle) in queued.iter().enumerate() {
            // Already resolved, so this cannot block.
            let value = handle.try_get().expect("shutdown waits for queued tasks");
            assert_eq!(*value.unwrap(), i + 1);
        }
    });
}

#[test]
fn submit_after_shutdown_is_rejected() {
    with_watchdog(|| {
        let pool = Pool::new(2).unwrap();
        pool.shutdown();

        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let ran = Arc::clone(&ran);
            let result = pool.submit(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });

            assert!(matches!(result, Err(Error::Rejected)));
        }

        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(pool.stats().submitted(), 0);
    });
}

#[test]
fn shutdown_twice_is_harmless() {
    with_watchdog(|| {
        let pool = Pool::new(3).unwrap();
        let handle = pool.submit(|| 9).unwrap();

        pool.shutdown();
        pool.shutdown();

        assert_eq!(pool.state(), PoolState::Stopped);
        assert_eq!(*handle.wait().unwrap(), 9);

        // Drop performs a third, equally harmless, shutdown.
        drop(pool);
    });
}

#[test]
fn concurrent_shutdowns_all_wait_for_stop() {
    with_watchdog(|| {
        let pool = Arc::new(Pool::new(2).unwrap());

        for _ in 0..20 {
            drop(pool.submit(|| thread::sleep(Duration::from_millis(2))).unwrap());
        }

        let callers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    pool.shutdown();
                    pool.state()
                })
            })
            .collect();

        for caller in callers {
            assert_eq!(caller.join().unwrap(), PoolState::Stopped);
        }
    });
}

#[test]
fn dropping_pool_drains_queue() {
    with_watchdog(|| {
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = {
            let pool = Pool::new(2).unwrap();

            (0..100)
                .map(|_| {
                    let completed = Arc::clone(&completed);
                    pool.submit(move || {
                        completed.fetch_add(1, Ordering::SeqCst);
                    })
                    .unwrap()
                })
                .collect()
        };

        assert_eq!(completed.load(Ordering::SeqCst), 100);
        assert!(handles.iter().all(task_pool::ResultHandle::is_resolved));
    });
}

#[test]
fn shutdown_from_worker_leaves_pool_draining_until_joined() {
    with_watchdog(|| {
        let pool = Arc::new(Pool::new(1).unwrap());
        let gate = Arc::new(Gate::default());
        let submitted = Arc::new(Barrier::new(2));
        let requested = Arc::new(Barrier::new(2));

        let requester = pool
            .submit({
                let pool = Arc::clone(&pool);
                let gate = Arc::clone(&gate);
                let submitted = Arc::clone(&submitted);
                let requested = Arc::clone(&requested);
                move || {
                    submitted.wait();
                    pool.shutdown();
                    requested.wait();
                    gate.wait();
                }
            })
            .unwrap();

        let queued = pool.submit(|| 7).unwrap();

        submitted.wait();
        requested.wait();

        // The only worker asked for shutdown but is still busy, with one task behind it.
        assert_eq!(pool.state(), PoolState::Draining);
        assert_eq!(pool.queued_len(), 1);
        assert!(!queued.is_resolved());

        gate.open();
        pool.shutdown();

        assert_eq!(pool.state(), PoolState::Stopped);
        requester.wait().unwrap();
        assert_eq!(*queued.try_get().expect("shutdown waits for queued tasks").unwrap(), 7);
    });
}
