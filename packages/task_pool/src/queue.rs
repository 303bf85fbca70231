use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};

use crate::ERR_POISONED_LOCK;

/// An unbounded first-in-first-out queue with blocking dequeue and a close signal.
///
/// This is the queue that feeds the workers of a [`Pool`][crate::Pool]. It is public
/// because it is useful on its own as a simple multi-producer multi-consumer handoff point.
///
/// Once closed, the queue rejects new items but still hands out the items it already holds.
/// Only after the last item is taken does [`dequeue()`][Self::dequeue] report the end of the
/// queue by returning [`None`].
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use task_pool::TaskQueue;
///
/// let queue = TaskQueue::new();
///
/// thread::scope(|s| {
///     let consumer = s.spawn(|| {
///         let mut received = Vec::new();
///         while let Some(item) = queue.dequeue() {
///             received.push(item);
///         }
///         received
///     });
///
///     queue.enqueue(1).unwrap();
///     queue.enqueue(2).unwrap();
///     queue.close();
///
///     assert_eq!(consumer.join().unwrap(), vec![1, 2]);
/// });
/// ```
#[derive(Debug)]
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,

    // Signaled whenever the queue becomes non-empty or closed.
    available: Condvar,
}

#[derive(Debug)]
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

impl<T> TaskQueue<T> {
    /// Creates an empty, open queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Appends an item to the tail of the queue and wakes one blocked consumer.
    ///
    /// # Errors
    ///
    /// Returns [`QueueClosed`] with the item handed back if the queue has been closed.
    pub fn enqueue(&self, item: T) -> Result<(), QueueClosed<T>> {
        {
            let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

            if state.closed {
                return Err(QueueClosed(item));
            }

            state.items.push_back(item);
        }

        // One item can only satisfy one consumer, so there is no point waking more.
        self.available.notify_one();

        Ok(())
    }

    /// Removes and returns the item at the head of the queue, blocking while the queue is
    /// empty and still open.
    ///
    /// Returns [`None`] once the queue is closed and every item has been taken.
    #[must_use]
    pub fn dequeue(&self) -> Option<T> {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);

        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }

            if state.closed {
                return None;
            }

            state = self.available.wait(state).expect(ERR_POISONED_LOCK);
        }
    }

    /// Closes the queue, rejecting any further items. Items already in the queue remain
    /// available to consumers.
    ///
    /// All blocked consumers are woken so they can observe the end of the queue.
    ///
    /// Returns `true` if this call closed the queue and `false` if it was already closed.
    pub fn close(&self) -> bool {
        let newly_closed = {
            let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
            !std::mem::replace(&mut state.closed, true)
        };

        self.available.notify_all();

        newly_closed
    }

    /// Whether [`close()`][Self::close] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().expect(ERR_POISONED_LOCK).closed
    }

    /// The number of items waiting in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().expect(ERR_POISONED_LOCK).items.len()
    }

    /// Whether the queue currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned by [`TaskQueue::enqueue()`] when the queue is closed. Contains the rejected item.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct QueueClosed<T>(pub T);

impl<T> QueueClosed<T> {
    /// Returns the item that was rejected.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

// Manual impl so that the item type does not need to be Debug (tasks are closures).
impl<T> fmt::Debug for QueueClosed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueClosed").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for QueueClosed<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract for error message.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "queue is closed")
    }
}

impl<T> std::error::Error for QueueClosed<T> {}
