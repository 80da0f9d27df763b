//! Cache system tests

use super::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_memory_store_basic_operations() {
    let store = MemoryCacheStore::unbounded();
    let now = Instant::now();

    assert!(store.get("user:7").is_none());

    store.put("user:7", json!({"name": "ada"}), now);
    let entry = store.get("user:7").unwrap();
    assert_eq!(entry.value, json!({"name": "ada"}));
    assert_eq!(entry.stored_at, now);

    store.remove("user:7");
    assert!(store.get("user:7").is_none());

    let stats = store.statistics();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.entry_count, 0);
}

#[test]
fn test_put_overwrites_wholesale() {
    let store = MemoryCacheStore::unbounded();
    let first = Instant::now();
    let second = first + Duration::from_secs(1);

    store.put("k", json!({"a": 1, "b": 2}), first);
    store.put("k", json!({"a": 3}), second);

    let entry = store.get("k").unwrap();
    assert_eq!(entry.value, json!({"a": 3}));
    assert_eq!(entry.stored_at, second);
    assert_eq!(store.statistics().entry_count, 1);
}

#[test]
fn test_unbounded_store_keeps_everything() {
    let store = MemoryCacheStore::unbounded();
    let now = Instant::now();

    for i in 0..1000 {
        store.put(&format!("key-{}", i), json!(i), now);
    }

    assert_eq!(store.statistics().entry_count, 1000);
    assert_eq!(store.statistics().evictions, 0);
    assert_eq!(store.get("key-0").unwrap().value, json!(0));
}

#[test]
fn test_bounded_store_evicts_least_recent() {
    let store = MemoryCacheStore::with_capacity(2);
    let now = Instant::now();

    store.put("a", json!(1), now);
    store.put("b", json!(2), now);
    // touch "a" so "b" becomes the eviction candidate
    assert!(store.get("a").is_some());
    store.put("c", json!(3), now);

    assert!(store.get("b").is_none());
    assert!(store.get("a").is_some());
    assert!(store.get("c").is_some());
    assert_eq!(store.statistics().evictions, 1);
}

#[test]
fn test_clear_keeps_counters() {
    let store = MemoryCacheStore::default();
    store.put("a", json!(1), Instant::now());
    store.clear();

    assert!(store.get("a").is_none());
    let stats = store.statistics();
    assert_eq!(stats.writes, 1);
    assert_eq!(stats.entry_count, 0);
}

#[test]
fn test_entry_freshness_window() {
    let stored = Instant::now();
    let entry = CacheEntry::new(json!("v"), stored);

    assert!(entry.is_fresh(Duration::from_millis(100), stored));
    assert!(entry.is_fresh(Duration::from_millis(100), stored + Duration::from_millis(99)));
    assert!(!entry.is_fresh(Duration::from_millis(100), stored + Duration::from_millis(100)));
    assert!(!entry.is_fresh(Duration::ZERO, stored));
}

#[test]
fn test_policy_keys() {
    let none = CachePolicy::default();
    assert_eq!(none.read_key(), None);
    assert_eq!(none.write_key(), None);

    let write_only = CachePolicy::write_only("k");
    assert_eq!(write_only.read_key(), None);
    assert_eq!(write_only.write_key(), Some("k"));

    let full = CachePolicy::new("k", Duration::from_secs(5));
    assert_eq!(full.read_key(), Some("k"));
    assert_eq!(full.write_key(), Some("k"));
}

#[test]
fn test_lookup_fresh_and_write_through() {
    let store = MemoryCacheStore::unbounded();
    let policy = CachePolicy::new("profile", Duration::from_secs(10));
    let now = Instant::now();

    assert_eq!(lookup_fresh::<String>(&store, &policy, now), None);

    write_through(&store, &policy, &"user:7".to_string(), now);

    assert_eq!(
        lookup_fresh::<String>(&store, &policy, now + Duration::from_secs(9)),
        Some("user:7".to_string())
    );
    assert_eq!(
        lookup_fresh::<String>(&store, &policy, now + Duration::from_secs(10)),
        None
    );
}

#[test]
fn test_lookup_treats_shape_mismatch_as_miss() {
    let store = MemoryCacheStore::unbounded();
    let policy = CachePolicy::new("n", Duration::from_secs(10));
    let now = Instant::now();

    store.put("n", json!("not a number"), now);

    assert_eq!(lookup_fresh::<u32>(&store, &policy, now), None);
}

#[test]
fn test_hit_rate() {
    let stats = CacheStatistics {
        hits: 3,
        misses: 1,
        ..Default::default()
    };
    assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    assert_eq!(CacheStatistics::default().hit_rate(), 0.0);
}
