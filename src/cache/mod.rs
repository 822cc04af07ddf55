//! Cache Module
//!
//! Provides a size-bounded in-memory cache with LRU eviction and lazy TTL
//! expiration.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::{Handle, Iter, RecencyIndex};
pub use stats::CacheStats;
pub use store::LruCache;
pub use value::CacheValue;
