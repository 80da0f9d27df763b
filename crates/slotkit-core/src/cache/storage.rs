//! Cache storage implementations

use super::types::{CacheEntry, CacheStatistics};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tokio::time::Instant;

/// Cache storage interface
///
/// Shared by every slot in the process, so implementations serialize their
/// own access.
pub trait CacheStore: Send + Sync + std::fmt::Debug {
    /// Get a cache entry
    fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Store `value` under `key`, replacing any previous entry
    fn put(&self, key: &str, value: serde_json::Value, now: Instant);

    /// Remove a cache entry
    fn remove(&self, key: &str) -> Option<CacheEntry>;

    /// Clear all entries
    fn clear(&self);

    /// Get storage statistics
    fn statistics(&self) -> CacheStatistics;
}

/// In-memory cache store
///
/// Unbounded by default: entries live until removed, cleared, or the store
/// is dropped. [`MemoryCacheStore::with_capacity`] adds an LRU bound.
#[derive(Debug)]
pub struct MemoryCacheStore {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    entries: LruCache<String, CacheEntry>,
    stats: CacheStatistics,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl MemoryCacheStore {
    /// Create a store that never evicts
    pub fn unbounded() -> Self {
        Self::from_lru(LruCache::unbounded())
    }

    /// Create a store that keeps at most `capacity` entries, evicting the
    /// least recently used
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self::from_lru(LruCache::new(capacity))
    }

    /// Create a store from an optional capacity, unbounded when `None`
    pub fn from_capacity(capacity: Option<usize>) -> Self {
        match capacity {
            Some(capacity) => Self::with_capacity(capacity),
            None => Self::unbounded(),
        }
    }

    fn from_lru(entries: LruCache<String, CacheEntry>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries,
                stats: CacheStatistics::default(),
            }),
        }
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut inner = self.inner.lock();
        let entry = inner.entries.get(key).cloned();
        if entry.is_some() {
            inner.stats.hits += 1;
        } else {
            inner.stats.misses += 1;
        }
        entry
    }

    fn put(&self, key: &str, value: serde_json::Value, now: Instant) {
        let mut inner = self.inner.lock();
        let entry = CacheEntry::new(value, now);

        if let Some((evicted_key, _)) = inner.entries.push(key.to_string(), entry) {
            if evicted_key != key {
                inner.stats.evictions += 1;
            }
        }

        inner.stats.writes += 1;
        inner.stats.entry_count = inner.entries.len();
    }

    fn remove(&self, key: &str) -> Option<CacheEntry> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.pop(key);
        inner.stats.entry_count = inner.entries.len();
        removed
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats.entry_count = 0;
    }

    fn statistics(&self) -> CacheStatistics {
        self.inner.lock().stats.clone()
    }
}
