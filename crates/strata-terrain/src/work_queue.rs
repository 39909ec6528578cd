//! A lock-guarded, unordered multiset shared between producers and consumers.
//!
//! Removal order is unspecified: the current implementation hands out the most
//! recently pushed element first. Callers that care about order must arrange
//! their pushes accordingly.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A multiset of `T` behind a single exclusive lock.
///
/// Every operation acquires the lock for a short, bounded time. No lock is
/// ever held while user code runs, so a poisoned lock is recovered rather
/// than propagated.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<Vec<T>>,
    available: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            available: Condvar::new(),
        }
    }

    /// Acquires the lock for a sequence of operations under one acquisition.
    pub fn lock(&self) -> WorkQueueGuard<'_, T> {
        WorkQueueGuard {
            items: self.items.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Adds one element and wakes one waiter.
    pub fn push(&self, item: T) {
        self.lock().push(item);
        self.available.notify_one();
    }

    /// Adds every element of `items` and wakes all waiters.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        let added = {
            let mut guard = self.lock();
            let before = guard.len();
            guard.items.extend(items);
            guard.len() - before
        };
        if added > 0 {
            self.available.notify_all();
        }
    }

    /// Removes one element, or `None` if the queue is empty.
    pub fn pop(&self) -> Option<T> {
        self.lock().pop()
    }

    /// Removes up to `max` elements.
    pub fn pop_many(&self, max: usize) -> Vec<T> {
        self.lock().pop_many(max)
    }

    /// Removes one element, waiting up to `timeout` for one to be pushed.
    ///
    /// Returns `None` on timeout or when woken by [`WorkQueue::notify_all`]
    /// with the queue still empty.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (guard, result) = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
            if result.timed_out() {
                tracing::trace!(?timeout, "queue wait timed out");
            }
        }
        items.pop()
    }

    /// Wakes every thread blocked in [`WorkQueue::pop_timeout`].
    pub fn notify_all(&self) {
        self.available.notify_all();
    }

    /// Returns `true` if nothing is queued right now.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of queued elements at the time of the call.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Copies the current contents without removing them.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.lock().items.clone()
    }
}

/// Exclusive access to a [`WorkQueue`] until dropped.
///
/// Pushes through a guard do not wake waiters; use [`WorkQueue::notify_all`]
/// after releasing it if workers may be blocked.
pub struct WorkQueueGuard<'a, T> {
    items: MutexGuard<'a, Vec<T>>,
}

impl<T> WorkQueueGuard<'_, T> {
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn pop_many(&mut self, max: usize) -> Vec<T> {
        let keep = self.items.len().saturating_sub(max);
        let mut taken = self.items.split_off(keep);
        taken.reverse();
        taken
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}
