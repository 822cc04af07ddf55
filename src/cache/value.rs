//! Cache Value Module
//!
//! Every stored value reports its own size, in the same unit as the cache
//! capacity (bytes for the implementations provided here).

use std::sync::Arc;

/// A value that can be stored in the cache.
pub trait CacheValue {
    /// Size of the value, counted against the cache capacity.
    fn size(&self) -> usize;
}

impl CacheValue for String {
    fn size(&self) -> usize {
        self.len()
    }
}

impl CacheValue for &'static str {
    fn size(&self) -> usize {
        self.len()
    }
}

impl CacheValue for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }
}

impl CacheValue for Box<[u8]> {
    fn size(&self) -> usize {
        self.len()
    }
}

// Shared values keep the size of what they point to, so large payloads can
// be stored behind an Arc and cloned out of `get` cheaply.
impl<T: CacheValue + ?Sized> CacheValue for Arc<T> {
    fn size(&self) -> usize {
        (**self).size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_sizes() {
        assert_eq!("hello".to_string().size(), 5);
        assert_eq!("héllo".size(), 6);
        assert_eq!(vec![0u8; 42].size(), 42);
        assert_eq!(vec![1u8; 7].into_boxed_slice().size(), 7);
        assert_eq!(Arc::new("abc".to_string()).size(), 3);
    }
}
