//! Thread-safe TTL cache for computed opportunity lists.
//!
//! Each engine owns an injected cache instance keyed by its query
//! parameters, rather than sharing module-global state. Pagination over
//! a live entry is stable: identical keys return the same `Arc`'d list
//! until the entry expires, is invalidated, or is overwritten.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

struct CacheEntry<V> {
    items: Arc<Vec<V>>,
    computed_at: Instant,
}

/// Last-write-wins map of query key to computed result list.
pub struct OpportunityCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K: Eq + Hash + Clone, V> OpportunityCache<K, V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a live entry's list, or `None` when absent or expired.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Arc<Vec<V>>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.computed_at.elapsed() > self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.items))
    }

    /// Store a freshly computed list, returning the shared handle.
    pub fn insert(&self, key: K, items: Vec<V>) -> Arc<Vec<V>> {
        let items = Arc::new(items);
        self.entries.write().insert(
            key,
            CacheEntry {
                items: Arc::clone(&items),
                computed_at: Instant::now(),
            },
        );
        items
    }

    /// Evict a single key.
    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Evict everything.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_what_was_inserted() {
        let cache: OpportunityCache<u32, &str> = OpportunityCache::new(Duration::from_secs(60));
        cache.insert(1, vec!["a", "b"]);

        let hit = cache.get(&1).unwrap();
        assert_eq!(*hit, vec!["a", "b"]);
        assert!(cache.get(&2).is_none());
    }

    #[test]
    fn expired_entries_miss() {
        let cache: OpportunityCache<u32, &str> = OpportunityCache::new(Duration::ZERO);
        cache.insert(1, vec!["a"]);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn invalidate_and_clear_evict() {
        let cache: OpportunityCache<u32, u32> = OpportunityCache::new(Duration::from_secs(60));
        cache.insert(1, vec![1]);
        cache.insert(2, vec![2]);

        cache.invalidate(&1);
        assert!(cache.get(&1).is_none());
        assert!(cache.get(&2).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn reinsert_wins_over_previous_entry() {
        let cache: OpportunityCache<u32, u32> = OpportunityCache::new(Duration::from_secs(60));
        cache.insert(1, vec![1]);
        cache.insert(1, vec![2]);
        assert_eq!(*cache.get(&1).unwrap(), vec![2]);
    }
}
