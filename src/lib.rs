//! LRU TTL Cache - A thread-safe, size-bounded in-memory cache
//!
//! Provides LRU eviction by aggregate value size with lazy TTL expiration,
//! plus a round-robin dispatch pool for running cache work on worker tasks.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, CacheValue, Clock, LruCache, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::{DispatchPool, SubmitTimeout};
