// src/cache.rs

//! Lazily populated, per-key memoized store shared by the font and graphic
//! caches.
//!
//! The map lock is held only long enough to fetch the key's cell. The cell
//! itself serializes construction, so two threads asking for the same key
//! build it once and different keys never block each other.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;
use once_cell::sync::OnceCell;

type Cell<V> = Arc<OnceCell<Option<Arc<V>>>>;

#[derive(Debug)]
pub struct MemoCache<K, V> {
    cells: Mutex<HashMap<K, Cell<V>>>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        MemoCache { cells: Mutex::new(HashMap::new()) }
    }
}

impl<K: Eq + Hash + Copy + std::fmt::Debug, V> MemoCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Cell<V>>> {
        // A panic while holding the map lock cannot leave a cell half built.
        self.cells.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the value for `key`, building it with `init` on first use.
    ///
    /// A `None` from `init` is remembered too, so a missing entry is looked up
    /// in the backing store only once.
    pub fn get_or_init<F>(&self, key: K, init: F) -> Option<Arc<V>>
    where
        F: FnOnce() -> Option<V>,
    {
        let cell = Arc::clone(self.lock().entry(key).or_default());
        cell.get_or_init(|| {
            trace!("MemoCache: building entry {:?}", key);
            init().map(Arc::new)
        })
        .clone()
    }

    /// Returns an already built value without touching the backing store.
    pub fn get(&self, key: K) -> Option<Arc<V>> {
        self.lock()
            .get(&key)
            .and_then(|cell| cell.get().cloned().flatten())
    }

    /// Number of keys that have been requested.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use test_log::test;

    #[test]
    fn test_builds_once_per_key() {
        let cache: MemoCache<i32, String> = MemoCache::new();
        let builds = AtomicUsize::new(0);
        let build = |k: i32| {
            builds.fetch_add(1, Ordering::SeqCst);
            Some(format!("v{}", k))
        };
        assert_eq!(cache.get_or_init(1, || build(1)).as_deref(), Some(&"v1".to_string()));
        assert_eq!(cache.get_or_init(1, || build(1)).as_deref(), Some(&"v1".to_string()));
        assert_eq!(cache.get_or_init(2, || build(2)).as_deref(), Some(&"v2".to_string()));
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_remembers_missing_entries() {
        let cache: MemoCache<i32, u8> = MemoCache::new();
        let builds = AtomicUsize::new(0);
        for _ in 0..3 {
            let v = cache.get_or_init(9, || {
                builds.fetch_add(1, Ordering::SeqCst);
                None
            });
            assert!(v.is_none());
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(cache.get(9).is_none());
    }

    #[test]
    fn test_concurrent_population_builds_once() {
        let cache: Arc<MemoCache<i32, usize>> = Arc::new(MemoCache::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    cache.get_or_init(7, || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Some(42)
                    })
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().map(|v| *v), Some(42));
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
