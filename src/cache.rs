//! Bounded LRU cache for retrieval results.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::document::RetrievalResult;

/// Cache key: normalized query text plus the requested result count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct QueryKey {
    pub query: String,
    pub top_k: usize,
}

/// Collapse whitespace and case so trivially-different spellings of the
/// same query share a cache entry.
pub(crate) fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Least-recently-used cache with fixed capacity and explicit invalidation.
///
/// The ingest path calls [`invalidate_all`](QueryCache::invalidate_all)
/// whenever the index changes, so cached results never outlive the corpus
/// they were computed against.
pub(crate) struct QueryCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

struct CacheInner {
    entries: HashMap<QueryKey, Vec<RetrievalResult>>,
    /// Keys ordered least-recently-used first.
    recency: Vec<QueryKey>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner { entries: HashMap::new(), recency: Vec::new() }),
            capacity,
        }
    }

    /// Look up a key, refreshing its recency on a hit.
    pub fn get(&self, key: &QueryKey) -> Option<Vec<RetrievalResult>> {
        let mut inner = self.inner.lock();
        let results = inner.entries.get(key)?.clone();
        inner.recency.retain(|k| k != key);
        inner.recency.push(key.clone());
        Some(results)
    }

    /// Insert a key, evicting the least-recently-used entry at capacity.
    pub fn put(&self, key: QueryKey, results: Vec<RetrievalResult>) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), results).is_none()
            && inner.entries.len() > self.capacity
        {
            let evicted = inner.recency.remove(0);
            inner.entries.remove(&evicted);
        }
        inner.recency.retain(|k| k != &key);
        inner.recency.push(key);
    }

    /// Drop every cached entry.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(query: &str, top_k: usize) -> QueryKey {
        QueryKey { query: normalize_query(query), top_k }
    }

    #[test]
    fn normalization_collapses_whitespace_and_case() {
        assert_eq!(normalize_query("  Battery   Fix \n"), "battery fix");
    }

    #[test]
    fn hit_and_miss() {
        let cache = QueryCache::new(4);
        cache.put(key("battery", 3), Vec::new());
        assert!(cache.get(&key("battery", 3)).is_some());
        assert!(cache.get(&key("battery", 5)).is_none());
        assert!(cache.get(&key("screen", 3)).is_none());
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = QueryCache::new(2);
        cache.put(key("a", 1), Vec::new());
        cache.put(key("b", 1), Vec::new());
        // Touch "a" so "b" becomes the eviction candidate.
        assert!(cache.get(&key("a", 1)).is_some());
        cache.put(key("c", 1), Vec::new());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("a", 1)).is_some());
        assert!(cache.get(&key("b", 1)).is_none());
        assert!(cache.get(&key("c", 1)).is_some());
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = QueryCache::new(4);
        cache.put(key("a", 1), Vec::new());
        cache.put(key("b", 1), Vec::new());
        cache.invalidate_all();
        assert_eq!(cache.len(), 0);
        assert!(cache.get(&key("a", 1)).is_none());
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = QueryCache::new(0);
        cache.put(key("a", 1), Vec::new());
        assert!(cache.get(&key("a", 1)).is_none());
    }
}
