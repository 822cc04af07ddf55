//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};

use crate::cache::CacheValue;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key the entry is stored under
    pub key: String,
    /// The stored value
    pub value: V,
    /// Size reported by the value when it was stored
    pub size: u64,
    /// Last time the entry was read or written
    pub accessed_at: DateTime<Utc>,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl<V: CacheValue> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the entry lives under
    /// * `value` - The value to store
    /// * `ttl_seconds` - TTL in seconds, `<= 0` means no expiration
    /// * `now` - Creation instant
    pub fn new(key: String, value: V, ttl_seconds: i64, now: DateTime<Utc>) -> Self {
        Self {
            key,
            size: value.size() as u64,
            value,
            accessed_at: now,
            expires_at: expiration_for(ttl_seconds, now),
        }
    }

    // == Replace ==
    /// Swaps in a new value, returning the signed change in size.
    pub fn replace(&mut self, value: V) -> i64 {
        let new_size = value.size() as u64;
        let delta = new_size as i64 - self.size as i64;
        self.value = value;
        self.size = new_size;
        delta
    }
}

impl<V> CacheEntry<V> {
    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once `now` reaches its
    /// expiration instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Touch ==
    /// Records an access at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.accessed_at = now;
    }
}

// == Utility Functions ==
/// Absolute expiration for a TTL given in seconds; non-positive TTLs never expire.
pub fn expiration_for(ttl_seconds: i64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if ttl_seconds <= 0 {
        return None;
    }
    Duration::try_seconds(ttl_seconds).and_then(|ttl| now.checked_add_signed(ttl))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("k".to_string(), "test_value".to_string(), 0, epoch());

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.size, 10);
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired(epoch() + Duration::days(365)));
    }

    #[test]
    fn test_entry_negative_ttl_never_expires() {
        let entry = CacheEntry::new("k".to_string(), "v".to_string(), -5, epoch());

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired(epoch() + Duration::days(365)));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("k".to_string(), "test_value".to_string(), 1, epoch());

        assert!(!entry.is_expired(epoch()));
        assert!(!entry.is_expired(epoch() + Duration::milliseconds(999)));
        assert!(entry.is_expired(epoch() + Duration::seconds(1)));
    }

    #[test]
    fn test_replace_reports_size_delta() {
        let mut entry = CacheEntry::new("k".to_string(), "abcd".to_string(), 0, epoch());

        assert_eq!(entry.replace("ab".to_string()), -2);
        assert_eq!(entry.size, 2);
        assert_eq!(entry.replace("abcdef".to_string()), 4);
        assert_eq!(entry.size, 6);
        assert_eq!(entry.value, "abcdef");
    }

    #[test]
    fn test_expiration_for_huge_ttl_saturates_to_none() {
        assert!(expiration_for(i64::MAX, epoch()).is_none());
        assert_eq!(
            expiration_for(5, epoch()),
            Some(epoch() + Duration::seconds(5))
        );
    }
}
