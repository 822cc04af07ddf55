//! Cache Statistics Module
//!
//! Point-in-time snapshot of cache occupancy plus simple hit/miss counters.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Snapshot returned by `LruCache::stats`.
///
/// `entries` may include entries that have expired but have not been
/// purged yet, since expiration is only discovered lazily.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries physically present
    pub entries: usize,
    /// Sum of the sizes of all present entries
    pub size: u64,
    /// Configured capacity
    pub capacity: u64,
    /// Last access of the least recently used entry, None when empty
    pub oldest_access: Option<DateTime<Utc>>,
    /// Number of successful lookups
    pub hits: u64,
    /// Number of failed lookups (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted under capacity pressure
    pub evictions: u64,
    /// Number of entries purged because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == JSON ==
    /// Renders the snapshot as a JSON object.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entries={} size={}/{} hits={} misses={} evictions={} expirations={} oldest_access=",
            self.entries,
            self.size,
            self.capacity,
            self.hits,
            self.misses,
            self.evictions,
            self.expirations,
        )?;
        match self.oldest_access {
            Some(at) => write!(f, "{}", at.to_rfc3339()),
            None => write!(f, "-"),
        }
    }
}

// == Counters ==
/// Running counters kept by the cache between snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl Counters {
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }
}
