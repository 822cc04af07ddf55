//! Error types for the cache and its dispatch pool
//!
//! Cache lookups never fail; absence is reported through `Option`/`bool`.
//! The only errors are configuration mistakes caught at construction time.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Capacity must be strictly positive
    #[error("Invalid capacity: {0} (must be greater than zero)")]
    InvalidCapacity(u64),

    /// Worker count must be strictly positive
    #[error("Invalid pool size: {0} workers (must be greater than zero)")]
    InvalidPoolSize(usize),

    /// Per-worker queue size must be strictly positive
    #[error("Invalid queue size: {0} (must be greater than zero)")]
    InvalidQueueSize(usize),

    /// Workers can only be spawned once per pool
    #[error("Dispatch pool '{0}' was already started")]
    PoolAlreadyStarted(String),
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
