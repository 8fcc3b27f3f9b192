//! A fixed-capacity, blocking, FIFO multi-producer multi-consumer queue.
//!
//! `push` blocks while the queue holds `capacity` items; `pop` blocks while
//! empty. Both wake exactly the waiters they need to make progress. Items
//! are opaque to the queue — it never inspects or drops them early.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct Inner<T> {
    items: VecDeque<T>,
    capacity: usize,
}

pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                capacity,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    /// Appends `item`, blocking while the queue is at capacity.
    pub fn push(&self, item: T) {
        let mut guard = self.inner.lock().unwrap();
        while guard.items.len() >= guard.capacity {
            guard = self.not_full.wait(guard).unwrap();
        }
        guard.items.push_back(item);
        drop(guard);
        self.not_empty.notify_one();
    }

    /// Removes and returns the oldest item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        let mut guard = self.inner.lock().unwrap();
        while guard.items.is_empty() {
            guard = self.not_empty.wait(guard).unwrap();
        }
        let item = guard.items.pop_front().expect("checked non-empty above");
        drop(guard);
        self.not_full.notify_one();
        item
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }
}
