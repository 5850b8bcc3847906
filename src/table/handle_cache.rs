//! Identity-keyed cache of shared handles.
//!
//! Entries hold [`Weak`] references: the cache never keeps a handle alive by
//! itself. An entry is live while at least one [`Arc`] to it exists anywhere;
//! once the last one is dropped the entry becomes a dead placeholder. A dead
//! placeholder never matches a lookup. It is replaced by the next load of the
//! same id, or removed by [`HandleCache::purge`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::Result;

/// Cache of `Arc<V>` handles keyed by a numeric identity (a file number).
#[derive(Debug)]
pub struct HandleCache<V> {
    entries: Mutex<HashMap<u64, Weak<V>>>,
}

impl<V> Default for HandleCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HandleCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live handle for `id`, if any.
    pub fn get(&self, id: u64) -> Option<Arc<V>> {
        self.entries.lock().get(&id).and_then(Weak::upgrade)
    }

    /// Returns the live handle for `id`, loading a new one if the entry is
    /// missing or dead.
    ///
    /// The boolean is true when no load was needed. `load` runs without the
    /// cache lock held, so two callers may load the same id at once; the
    /// first to register wins and the other's handle is dropped.
    pub fn get_or_try_insert_with<F>(&self, id: u64, load: F) -> Result<(Arc<V>, bool)>
    where
        F: FnOnce() -> Result<Arc<V>>,
    {
        if let Some(live) = self.get(id) {
            return Ok((live, true));
        }

        let handle = load()?;
        let mut entries = self.entries.lock();
        if let Some(winner) = entries.get(&id).and_then(Weak::upgrade) {
            return Ok((winner, false));
        }
        entries.insert(id, Arc::downgrade(&handle));
        Ok((handle, false))
    }

    /// Registers `handle` under `id`, replacing any previous entry.
    pub fn insert(&self, id: u64, handle: &Arc<V>) {
        self.entries.lock().insert(id, Arc::downgrade(handle));
    }

    /// Forgets `id`. Outstanding handles stay valid.
    pub fn remove(&self, id: u64) -> bool {
        self.entries.lock().remove(&id).is_some()
    }

    /// Removes dead placeholders and returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Number of entries, live or dead.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Number of entries whose handle is still alive.
    pub fn live_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_same_handle_while_alive() {
        let cache: HandleCache<String> = HandleCache::new();

        let (first, hit) = cache
            .get_or_try_insert_with(7, || Ok(Arc::new("t7".to_string())))
            .unwrap();
        assert!(!hit);

        let (second, hit) = cache
            .get_or_try_insert_with(7, || panic!("live entry must not reload"))
            .unwrap();
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_dead_entry_never_matches() {
        let cache: HandleCache<String> = HandleCache::new();
        let handle = Arc::new("t1".to_string());
        cache.insert(1, &handle);
        assert!(cache.get(1).is_some());

        drop(handle);
        assert!(cache.get(1).is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.live_count(), 0);

        let (reloaded, hit) = cache
            .get_or_try_insert_with(1, || Ok(Arc::new("t1'".to_string())))
            .unwrap();
        assert!(!hit);
        assert_eq!(reloaded.as_str(), "t1'");
    }

    #[test]
    fn test_purge_removes_only_dead() {
        let cache: HandleCache<u32> = HandleCache::new();
        let kept = Arc::new(1);
        cache.insert(1, &kept);
        cache.insert(2, &Arc::new(2));
        cache.insert(3, &Arc::new(3));

        assert_eq!(cache.purge(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).as_deref(), Some(&1));
    }

    #[test]
    fn test_failed_load_leaves_no_entry() {
        let cache: HandleCache<u32> = HandleCache::new();
        let result = cache.get_or_try_insert_with(9, || Err(Error::not_found("table 9")));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_may_use_the_cache() {
        let cache: HandleCache<u32> = HandleCache::new();
        let other = Arc::new(1);
        cache.insert(1, &other);

        // The loader reads another entry; this would deadlock under the lock.
        let (handle, hit) = cache
            .get_or_try_insert_with(2, || {
                let seen = cache.get(1).map_or(0, |v| *v);
                Ok(Arc::new(seen + 1))
            })
            .unwrap();
        assert!(!hit);
        assert_eq!(*handle, 2);
        assert_eq!(cache.get(2).as_deref(), Some(&2));
    }

    #[test]
    fn test_concurrent_load_keeps_first_registered() {
        let cache: HandleCache<u32> = HandleCache::new();
        let winner = Arc::new(10);

        // Another reader registers the id while this load is running.
        let (handle, hit) = cache
            .get_or_try_insert_with(5, || {
                cache.insert(5, &winner);
                Ok(Arc::new(20))
            })
            .unwrap();
        assert!(!hit);
        assert!(Arc::ptr_eq(&handle, &winner));
        assert!(Arc::ptr_eq(&cache.get(5).unwrap(), &winner));
    }
}
