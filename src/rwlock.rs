//! An N-way fair reader/writer lock.
//!
//! Bounds how many consecutive grants of one mode may bypass a waiter of
//! the other: at most `n` reader *batches* may run back-to-back before a
//! waiting writer is admitted, and symmetrically at most `n` writers before
//! a waiting batch of readers is admitted. With `n = 1` (the default used
//! throughout this crate) this degenerates to strict alternation: one
//! writer, then the whole batch of readers waiting at that moment, then one
//! writer, and so on.
//!
//! Readers sharing a batch never wait on each other — only the first reader
//! to arrive in an empty, writer-free lock consumes a grant of the read
//! phase counter; the rest just join the active batch.

use std::sync::{Arc, Condvar, Mutex};

struct State {
    active_readers: usize,
    active_writer: bool,
    waiting_readers: usize,
    waiting_writers: usize,
    read_batches_since_write: usize,
    write_grants_since_read: usize,
}

pub struct NWayRwLock {
    n: usize,
    state: Mutex<State>,
    cond: Condvar,
}

impl NWayRwLock {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "fairness parameter must be positive");
        Self {
            n,
            state: Mutex::new(State {
                active_readers: 0,
                active_writer: false,
                waiting_readers: 0,
                waiting_writers: 0,
                read_batches_since_write: 0,
                write_grants_since_read: 0,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn read(&self) -> ReadGuard<'_> {
        self.acquire_read();
        ReadGuard { lock: self }
    }

    pub fn write(&self) -> WriteGuard<'_> {
        self.acquire_write();
        WriteGuard { lock: self }
    }

    /// Like [`NWayRwLock::read`], but the guard owns an `Arc` clone of the
    /// lock instead of borrowing it — for callers (such as the lock
    /// registry) that can't pin a reference to the lock's owner in scope.
    pub fn read_owned(self: &Arc<Self>) -> OwnedReadGuard {
        self.acquire_read();
        OwnedReadGuard { lock: self.clone() }
    }

    pub fn write_owned(self: &Arc<Self>) -> OwnedWriteGuard {
        self.acquire_write();
        OwnedWriteGuard { lock: self.clone() }
    }

    fn acquire_read(&self) {
        let mut g = self.state.lock().unwrap();
        loop {
            let admit = !g.active_writer && (g.waiting_writers == 0 || g.read_batches_since_write < self.n);
            if admit {
                if g.active_readers == 0 {
                    g.read_batches_since_write += 1;
                }
                g.active_readers += 1;
                break;
            }
            g.waiting_readers += 1;
            g = self.cond.wait(g).unwrap();
            g.waiting_readers -= 1;
        }
    }

    fn acquire_write(&self) {
        let mut g = self.state.lock().unwrap();
        loop {
            let admit = !g.active_writer
                && g.active_readers == 0
                && (g.waiting_readers == 0 || g.write_grants_since_read < self.n);
            if admit {
                g.active_writer = true;
                g.write_grants_since_read += 1;
                break;
            }
            g.waiting_writers += 1;
            g = self.cond.wait(g).unwrap();
            g.waiting_writers -= 1;
        }
    }

    fn release_read(&self) {
        let mut g = self.state.lock().unwrap();
        g.active_readers -= 1;
        if g.active_readers == 0 && g.waiting_writers > 0 {
            g.write_grants_since_read = 0;
            drop(g);
            self.cond.notify_one();
        }
    }

    fn release_write(&self) {
        let mut g = self.state.lock().unwrap();
        g.active_writer = false;
        if g.waiting_readers > 0 {
            g.read_batches_since_write = 0;
            drop(g);
            self.cond.notify_all();
        } else if g.waiting_writers > 0 {
            drop(g);
            self.cond.notify_one();
        }
    }
}

pub struct ReadGuard<'a> {
    lock: &'a NWayRwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

pub struct WriteGuard<'a> {
    lock: &'a NWayRwLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}

pub struct OwnedReadGuard {
    lock: Arc<NWayRwLock>,
}

impl Drop for OwnedReadGuard {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

pub struct OwnedWriteGuard {
    lock: Arc<NWayRwLock>,
}

impl Drop for OwnedWriteGuard {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}
