//! Cache Store Module
//!
//! Main cache engine combining a key lookup table with the recency index,
//! size-based LRU eviction and lazy TTL expiration.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::entry::expiration_for;
use crate::cache::stats::Counters;
use crate::cache::{
    CacheEntry, CacheStats, CacheValue, Clock, Handle, RecencyIndex, SystemClock,
};
use crate::error::{CacheError, Result};

// == LRU Cache ==
/// Thread-safe, size-bounded cache with LRU eviction and optional TTL.
///
/// Every operation, `get` included, takes the same exclusive lock: a read
/// moves the entry to the front and may purge it if its TTL has elapsed.
///
/// Capacity is measured in the unit reported by [`CacheValue::size`].
/// After each write the least recently used entries are evicted until the
/// total fits again. The most recent entry is never evicted by its own
/// write, so a single value larger than the whole capacity stays cached,
/// leaving the cache over capacity while it is the only entry.
///
/// Expiration is lazy. There is no background sweep; an expired entry is
/// removed when `get` finds it, when capacity pressure evicts it, or on
/// `clear`. Until then it still counts in [`CacheStats::entries`].
pub struct LruCache<V, C = SystemClock> {
    inner: Mutex<Inner<V>>,
    clock: C,
}

impl<V: CacheValue> LruCache<V, SystemClock> {
    // == Constructor ==
    /// Creates a new cache backed by the system clock.
    ///
    /// Fails with [`CacheError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: u64) -> Result<Self> {
        Self::with_clock(capacity, SystemClock)
    }
}

impl<V: CacheValue, C: Clock> LruCache<V, C> {
    /// Creates a new cache that reads time from `clock`.
    pub fn with_clock(capacity: u64, clock: C) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        Ok(Self {
            inner: Mutex::new(Inner::new(capacity)),
            clock,
        })
    }

    // == Set ==
    /// Stores a value with no expiration.
    ///
    /// An existing entry is updated in place: its value and size are
    /// replaced, it moves to the front and any previous TTL is dropped.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.write(key.into(), value, 0, WriteMode::Overwrite);
    }

    /// Stores a value that expires `ttl_seconds` from now.
    ///
    /// `ttl_seconds <= 0` means the entry never expires. An existing entry
    /// has its value replaced and its expiration reset.
    pub fn set_ex(&self, key: impl Into<String>, value: V, ttl_seconds: i64) {
        self.write(key.into(), value, ttl_seconds, WriteMode::Overwrite);
    }

    // == Set If Absent ==
    /// Stores a value only if the key is not already live.
    ///
    /// If the key exists, it only moves to the front; value, size and
    /// expiration are left untouched.
    pub fn set_if_absent(&self, key: impl Into<String>, value: V) {
        self.write(key.into(), value, 0, WriteMode::KeepExisting);
    }

    /// [`set_if_absent`](Self::set_if_absent) with a TTL for the inserted entry.
    pub fn set_if_absent_ex(&self, key: impl Into<String>, value: V, ttl_seconds: i64) {
        self.write(key.into(), value, ttl_seconds, WriteMode::KeepExisting);
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.table.get(key).copied() {
            Some(handle) => inner.remove(handle).is_some(),
            None => false,
        }
    }

    // == Clear ==
    /// Drops every entry. Hit/miss counters are kept.
    pub fn clear(&self) {
        let dropped = {
            let mut inner = self.inner.lock();
            let dropped = inner.index.len();
            inner.index.clear();
            inner.table.clear();
            inner.size = 0;
            dropped
        };
        debug!("Cache cleared, {} entries dropped", dropped);
    }

    // == Set Capacity ==
    /// Changes the capacity and evicts immediately if the cache no longer fits.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidCapacity`] for a zero capacity, leaving
    /// the current capacity and contents untouched. Any positive capacity
    /// succeeds.
    pub fn set_capacity(&self, capacity: u64) -> Result<()> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity(capacity));
        }
        let (previous, evicted) = {
            let mut inner = self.inner.lock();
            let previous = inner.capacity;
            inner.capacity = capacity;
            (previous, inner.enforce_capacity())
        };
        info!(
            "Cache capacity changed from {} to {}, {} entries evicted",
            previous, capacity, evicted
        );
        Ok(())
    }

    // == Keys ==
    /// Snapshot of live keys, most recently used first.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let now = self.clock.now();
        inner
            .live_entries(now)
            .map(|entry| entry.key.clone())
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.index.len(),
            size: inner.size,
            capacity: inner.capacity,
            oldest_access: inner.oldest(),
            hits: inner.counters.hits,
            misses: inner.counters.misses,
            evictions: inner.counters.evictions,
            expirations: inner.counters.expirations,
        }
    }

    /// Current statistics rendered as JSON.
    pub fn stats_json(&self) -> String {
        self.stats().to_json()
    }

    // == Accessors ==
    /// Number of entries physically present, expired ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().index.is_empty()
    }

    /// Aggregate size of all present entries.
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    pub fn capacity(&self) -> u64 {
        self.inner.lock().capacity
    }

    /// Last access of the least recently used entry.
    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().oldest()
    }

    fn write(&self, key: String, value: V, ttl_seconds: i64, mode: WriteMode) {
        let purged = {
            let mut inner = self.inner.lock();
            let now = self.clock.now();
            inner.write(key, value, ttl_seconds, mode, now)
        };
        purged.log();
    }
}

impl<V: CacheValue + Clone, C: Clock> LruCache<V, C> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit moves the entry to the front. An entry whose TTL has elapsed is
    /// removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let (value, purged) = {
            let mut inner = self.inner.lock();
            let now = self.clock.now();
            inner.get(key, now)
        };
        if purged {
            debug!("Purged expired entry '{}' on read", key);
        }
        value
    }

    // == Items ==
    /// Snapshot of live `(key, value)` pairs, most recently used first.
    pub fn items(&self) -> Vec<(String, V)> {
        let inner = self.inner.lock();
        let now = self.clock.now();
        inner
            .live_entries(now)
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect()
    }
}

impl<V, C> fmt::Debug for LruCache<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("LruCache")
            .field("entries", &inner.index.len())
            .field("size", &inner.size)
            .field("capacity", &inner.capacity)
            .finish()
    }
}

// == Inner State ==

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Overwrite,
    KeepExisting,
}

/// What a write removed besides the key it touched, logged once the lock is released.
#[derive(Debug, Default)]
struct Purged {
    evicted: usize,
    expired: bool,
}

impl Purged {
    fn log(&self) {
        if self.expired {
            debug!("Replaced expired entry");
        }
        if self.evicted > 0 {
            debug!("Evicted {} least recently used entries", self.evicted);
        }
    }
}

struct Inner<V> {
    index: RecencyIndex<CacheEntry<V>>,
    table: HashMap<String, Handle>,
    size: u64,
    capacity: u64,
    counters: Counters,
}

impl<V> Inner<V> {
    fn new(capacity: u64) -> Self {
        Self {
            index: RecencyIndex::new(),
            table: HashMap::new(),
            size: 0,
            capacity,
            counters: Counters::default(),
        }
    }

    fn oldest(&self) -> Option<DateTime<Utc>> {
        self.index
            .back()
            .and_then(|handle| self.index.get(handle))
            .map(|entry| entry.accessed_at)
    }

    fn live_entries(&self, now: DateTime<Utc>) -> impl Iterator<Item = &CacheEntry<V>> {
        self.index
            .iter()
            .map(|(_, entry)| entry)
            .filter(move |entry| !entry.is_expired(now))
    }

    fn is_expired(&self, handle: Handle, now: DateTime<Utc>) -> bool {
        self.index
            .get(handle)
            .is_some_and(|entry| entry.is_expired(now))
    }

    fn touch(&mut self, handle: Handle, now: DateTime<Utc>) {
        self.index.move_to_front(handle);
        if let Some(entry) = self.index.get_mut(handle) {
            entry.touch(now);
        }
    }

    /// Unlinks an entry from both structures and releases its size.
    fn remove(&mut self, handle: Handle) -> Option<CacheEntry<V>> {
        let entry = self.index.remove(handle)?;
        self.table.remove(&entry.key);
        self.size -= entry.size;
        Some(entry)
    }

    /// Evicts from the back until the cache fits, always sparing the front entry.
    fn enforce_capacity(&mut self) -> usize {
        let mut evicted = 0;
        while self.size > self.capacity && self.index.len() > 1 {
            let Some(handle) = self.index.back() else {
                break;
            };
            if self.remove(handle).is_none() {
                break;
            }
            evicted += 1;
        }
        self.counters.record_evictions(evicted);
        evicted
    }
}

impl<V: CacheValue> Inner<V> {
    fn write(
        &mut self,
        key: String,
        value: V,
        ttl_seconds: i64,
        mode: WriteMode,
        now: DateTime<Utc>,
    ) -> Purged {
        let mut purged = Purged::default();
        match self.table.get(&key).copied() {
            Some(handle) if mode == WriteMode::Overwrite => {
                purged.evicted = self.update(handle, value, ttl_seconds, now);
            }
            Some(handle) if self.is_expired(handle, now) => {
                self.remove(handle);
                self.counters.record_expiration();
                purged.expired = true;
                purged.evicted = self.insert(key, value, ttl_seconds, now);
            }
            Some(handle) => self.touch(handle, now),
            None => purged.evicted = self.insert(key, value, ttl_seconds, now),
        }
        purged
    }

    fn insert(&mut self, key: String, value: V, ttl_seconds: i64, now: DateTime<Utc>) -> usize {
        let entry = CacheEntry::new(key.clone(), value, ttl_seconds, now);
        self.size += entry.size;
        let handle = self.index.push_front(entry);
        self.table.insert(key, handle);
        self.enforce_capacity()
    }

    fn update(&mut self, handle: Handle, value: V, ttl_seconds: i64, now: DateTime<Utc>) -> usize {
        if let Some(entry) = self.index.get_mut(handle) {
            let delta = entry.replace(value);
            entry.expires_at = expiration_for(ttl_seconds, now);
            self.size = self.size.saturating_add_signed(delta);
        }
        self.touch(handle, now);
        self.enforce_capacity()
    }
}

impl<V: Clone> Inner<V> {
    /// Returns the value (if live) and whether an expired entry was purged.
    fn get(&mut self, key: &str, now: DateTime<Utc>) -> (Option<V>, bool) {
        let Some(handle) = self.table.get(key).copied() else {
            self.counters.record_miss();
            return (None, false);
        };
        if self.is_expired(handle, now) {
            self.remove(handle);
            self.counters.record_expiration();
            self.counters.record_miss();
            return (None, true);
        }
        self.touch(handle, now);
        self.counters.record_hit();
        (self.index.get(handle).map(|entry| entry.value.clone()), false)
    }
}
