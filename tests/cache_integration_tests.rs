//! Integration Tests for the cache and dispatch pool
//!
//! Exercises the public API end to end: eviction scenarios, TTL with a
//! controllable clock, concurrent callers and pool-driven workloads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use lru_ttl_cache::{CacheError, CacheValue, DispatchPool, LruCache, ManualClock, SubmitTimeout};

// == Helper Functions ==

fn sized(size: usize) -> String {
    "v".repeat(size)
}

fn manual_cache(capacity: u64) -> (LruCache<String, ManualClock>, ManualClock) {
    let clock = ManualClock::default();
    let cache = LruCache::with_clock(capacity, clock.clone()).unwrap();
    (cache, clock)
}

// == Eviction Scenarios ==

#[test]
fn test_three_inserts_over_capacity_evict_oldest() {
    let (cache, _) = manual_cache(10);

    cache.set("A", sized(4));
    cache.set("B", sized(4));
    cache.set("C", sized(4));

    assert_eq!(cache.get("A"), None);
    assert_eq!(cache.get("B"), Some(sized(4)));
    assert_eq!(cache.get("C"), Some(sized(4)));

    let stats = cache.stats();
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.size, 8);
    assert_eq!(stats.evictions, 1);
}

#[test]
fn test_eviction_follows_access_not_insertion() {
    let (cache, _) = manual_cache(9);

    cache.set("a", sized(3));
    cache.set("b", sized(3));
    cache.set("c", sized(3));
    cache.set_if_absent("a", sized(1)); // refresh only
    cache.get("b");
    cache.set("d", sized(6));

    // c was least recent, then a
    assert_eq!(cache.keys(), vec!["d".to_string(), "b".to_string()]);
    assert_eq!(cache.size(), 9);
}

#[test]
fn test_shrinking_capacity_evicts_immediately() {
    let (cache, _) = manual_cache(100);
    for i in 0..10 {
        cache.set(format!("k{}", i), sized(10));
    }

    cache.set_capacity(35).unwrap();

    let stats = cache.stats();
    assert_eq!(stats.capacity, 35);
    assert_eq!(stats.size, 30);
    assert_eq!(
        cache.keys(),
        vec!["k9".to_string(), "k8".to_string(), "k7".to_string()]
    );
}

// == TTL Scenarios ==

#[test]
fn test_set_ex_expires_lazily() {
    let (cache, clock) = manual_cache(100);

    cache.set_ex("x", "value".to_string(), 5);

    clock.advance_secs(3);
    assert_eq!(cache.get("x"), Some("value".to_string()));

    clock.advance_secs(3);
    // Still physically present until something reads it
    assert_eq!(cache.stats().entries, 1);
    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.stats().entries, 0);
    assert_eq!(cache.size(), 0);
}

#[test]
fn test_expired_entries_are_first_to_go_under_pressure() {
    let (cache, clock) = manual_cache(10);

    cache.set_ex("old", sized(5), 1);
    cache.set("keep", sized(5));
    clock.advance_secs(2);
    cache.set("new", sized(5));

    assert_eq!(cache.keys(), vec!["new".to_string(), "keep".to_string()]);
    assert_eq!(cache.size(), 10);
}

#[test]
fn test_items_snapshot_is_independent() {
    let (cache, _) = manual_cache(100);
    cache.set("a", "1".to_string());
    cache.set("b", "2".to_string());

    let items = cache.items();
    cache.clear();

    assert_eq!(
        items,
        vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string())
        ]
    );
    assert!(cache.items().is_empty());
}

// == Construction ==

#[test]
fn test_zero_capacity_fails_fast() {
    let result: Result<LruCache<String>, CacheError> = LruCache::new(0);
    assert_eq!(result.err(), Some(CacheError::InvalidCapacity(0)));
}

#[test]
fn test_custom_value_type() {
    #[derive(Clone, Debug, PartialEq)]
    struct Blob {
        bytes: usize,
    }

    impl CacheValue for Blob {
        fn size(&self) -> usize {
            self.bytes
        }
    }

    let cache: LruCache<Blob> = LruCache::new(1_000).unwrap();
    cache.set("one", Blob { bytes: 600 });
    cache.set("two", Blob { bytes: 600 });

    assert_eq!(cache.get("one"), None);
    assert_eq!(cache.get("two"), Some(Blob { bytes: 600 }));
    assert_eq!(cache.size(), 600);
}

#[test]
fn test_shared_values_report_inner_size() {
    let cache: LruCache<Arc<Vec<u8>>> = LruCache::new(64).unwrap();
    let payload = Arc::new(vec![0u8; 48]);

    cache.set("blob", Arc::clone(&payload));

    let fetched = cache.get("blob").unwrap();
    assert!(Arc::ptr_eq(&fetched, &payload));
    assert_eq!(cache.size(), 48);
}

// == Concurrency ==

#[test]
fn test_concurrent_writers_keep_size_consistent() {
    let cache: Arc<LruCache<String>> = Arc::new(LruCache::new(500).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", (t * 31 + i) % 64);
                    match i % 5 {
                        0 => {
                            cache.delete(&key);
                        }
                        1 => {
                            cache.get(&key);
                        }
                        2 => cache.set_if_absent(key, sized(1 + i % 17)),
                        _ => cache.set(key, sized(1 + (i * t) % 23)),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    let items = cache.items();
    let total: u64 = items.iter().map(|(_, v)| v.len() as u64).sum();
    assert_eq!(stats.size, total);
    assert_eq!(stats.entries, items.len());
    assert!(stats.size <= stats.capacity);
}

// == Dispatch Pool ==

#[tokio::test]
async fn test_pool_drives_cache_writes() {
    let cache: Arc<LruCache<String>> = Arc::new(LruCache::new(10_000).unwrap());
    let mut pool = DispatchPool::new("writes", 4, 8).unwrap();
    pool.start().unwrap();

    for i in 0..200 {
        let cache = Arc::clone(&cache);
        let queued = pool
            .submit_with(
                move || cache.set(format!("k{}", i), i.to_string()),
                SubmitTimeout::Forever,
            )
            .await;
        assert!(queued);
    }
    pool.stop().await;

    assert_eq!(cache.len(), 200);
    assert_eq!(cache.get("k123"), Some("123".to_string()));
}

#[tokio::test]
async fn test_pool_survives_panicking_jobs() {
    let mut pool = DispatchPool::new("mixed", 2, 4).unwrap();
    pool.start().unwrap();
    let done = Arc::new(AtomicUsize::new(0));

    for i in 0..20 {
        let done = Arc::clone(&done);
        let queued = pool
            .submit_with(
                move || {
                    if i % 4 == 0 {
                        panic!("job {} failed", i);
                    }
                    done.fetch_add(1, Ordering::SeqCst);
                },
                SubmitTimeout::Forever,
            )
            .await;
        assert!(queued);
    }
    pool.stop().await;

    assert_eq!(done.load(Ordering::SeqCst), 15);
}

#[test]
fn test_pool_misconfiguration_fails_fast() {
    assert_eq!(
        DispatchPool::new("bad", 0, 1).err(),
        Some(CacheError::InvalidPoolSize(0))
    );
    assert_eq!(
        DispatchPool::new("bad", 1, 0).err(),
        Some(CacheError::InvalidQueueSize(0))
    );
}
