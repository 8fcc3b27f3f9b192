//! Per-path lock registry.
//!
//! Entries are created on first reference and never removed: the namespace
//! is small (bounded by the files actually touched), and removal would need
//! reference counting to avoid dropping a lock a racing worker is about to
//! acquire. The registry mutex is held for every lookup — the simplest
//! correct choice per the design notes; it dominates only under extreme
//! contention, at which point a striped or lock-free map would replace it.

use crate::rwlock::{NWayRwLock, OwnedReadGuard, OwnedWriteGuard};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct LockRegistry {
    fairness: usize,
    entries: Mutex<HashMap<String, Arc<NWayRwLock>>>,
}

impl LockRegistry {
    pub fn new(fairness: usize) -> Self {
        Self {
            fairness,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, path: &str) -> Arc<NWayRwLock> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(lock) = entries.get(path) {
            return lock.clone();
        }
        let lock = Arc::new(NWayRwLock::new(self.fairness));
        entries.insert(path.to_string(), lock.clone());
        lock
    }

    pub fn acquire_read(&self, path: &str) -> OwnedReadGuard {
        self.lock_for(path).read_owned()
    }

    pub fn acquire_write(&self, path: &str) -> OwnedWriteGuard {
        self.lock_for(path).write_owned()
    }

    #[cfg(test)]
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_path_resolves_to_same_lock_instance() {
        let registry = LockRegistry::new(1);
        let _r1 = registry.acquire_read("a");
        assert_eq!(registry.entry_count(), 1);
        let _r2 = registry.acquire_read("a");
        assert_eq!(registry.entry_count(), 1, "second reference to same path must not create a new entry");
    }

    #[test]
    fn distinct_paths_get_independent_locks() {
        let registry = Arc::new(LockRegistry::new(1));
        let g_a = registry.acquire_write("a");

        let registry2 = registry.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        let h = thread::spawn(move || {
            let _g_b = registry2.acquire_write("b");
            tx.send(()).unwrap();
        });
        rx.recv_timeout(Duration::from_secs(1))
            .expect("write on a distinct path must not be blocked by a's writer lock");
        h.join().unwrap();
        drop(g_a);
    }

    #[test]
    fn write_on_path_blocks_concurrent_read_on_same_path() {
        let registry = Arc::new(LockRegistry::new(1));
        let g = registry.acquire_write("x");

        let registry2 = registry.clone();
        let (tx, rx) = std::sync::mpsc::channel();
        let h = thread::spawn(move || {
            let _r = registry2.acquire_read("x");
            tx.send(()).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(g);
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        h.join().unwrap();
    }
}
