//! Caching for slot results
//!
//! A [`CacheStore`] is shared by every slot that should see the same
//! results. Slots write successful values through to it and, when their
//! [`CachePolicy`] has a positive staleness window, serve fresh entries
//! instead of invoking their operation again.

pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use storage::{CacheStore, MemoryCacheStore};
pub use types::{CacheEntry, CachePolicy, CacheStatistics};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;

/// Read a fresh value of type `T` for `policy`, if any.
///
/// Entries that fail to deserialize into `T` are treated as misses.
pub fn lookup_fresh<T>(store: &dyn CacheStore, policy: &CachePolicy, now: Instant) -> Option<T>
where
    T: DeserializeOwned,
{
    let key = policy.read_key()?;
    let entry = store.get(key)?;

    if !entry.is_fresh(policy.stale_time, now) {
        tracing::debug!(key, age_ms = entry.age(now).as_millis() as u64, "cache entry stale");
        return None;
    }

    match serde_json::from_value(entry.value) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, "cached value has unexpected shape: {}", e);
            None
        }
    }
}

/// Write `value` through to the store if `policy` names a key
pub fn write_through<T>(store: &dyn CacheStore, policy: &CachePolicy, value: &T, now: Instant)
where
    T: Serialize,
{
    let Some(key) = policy.write_key() else {
        return;
    };

    match serde_json::to_value(value) {
        Ok(json) => store.put(key, json, now),
        Err(e) => tracing::warn!(key, "value not cacheable: {}", e),
    }
}
