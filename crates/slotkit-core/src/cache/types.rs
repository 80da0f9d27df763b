//! Cache types and data structures

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Cache entry: a value and the moment it was stored
///
/// Entries are immutable once written; a later write for the same key
/// replaces the entry wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Cached value
    pub value: serde_json::Value,
    /// When the entry was stored
    pub stored_at: Instant,
}

impl CacheEntry {
    /// Create a new cache entry
    pub fn new(value: serde_json::Value, stored_at: Instant) -> Self {
        Self { value, stored_at }
    }

    /// Time elapsed since the entry was stored
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    /// Check if the entry is still within its freshness window.
    ///
    /// A zero window is never fresh.
    pub fn is_fresh(&self, window: Duration, now: Instant) -> bool {
        self.age(now) < window
    }
}

/// Per-slot cache configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Key results are written under; `None` disables caching
    pub key: Option<String>,
    /// Freshness window for reads; zero disables reads but keeps writes
    #[serde(with = "humantime_serde", default)]
    pub stale_time: Duration,
}

impl CachePolicy {
    /// Create a policy that reads and writes `key`
    pub fn new(key: impl Into<String>, stale_time: Duration) -> Self {
        Self {
            key: Some(key.into()),
            stale_time,
        }
    }

    /// Create a policy that only writes through, never serving from cache
    pub fn write_only(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            stale_time: Duration::ZERO,
        }
    }

    /// Key to consult before invoking, if reads are enabled
    pub fn read_key(&self) -> Option<&str> {
        if self.stale_time.is_zero() {
            None
        } else {
            self.key.as_deref()
        }
    }

    /// Key to write successful results to, if any
    pub fn write_key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Counters kept by a cache store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatistics {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries written
    pub writes: u64,
    /// Entries dropped to respect a capacity bound
    pub evictions: u64,
    /// Entries currently held
    pub entry_count: usize,
}

impl CacheStatistics {
    /// Fraction of lookups that found an entry
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
