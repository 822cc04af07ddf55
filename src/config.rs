//! Configuration Module
//!
//! Loads cache, pool and workload settings from environment variables.

use std::env;
use std::str::FromStr;

use crate::error::{CacheError, Result};
use crate::tasks::SubmitTimeout;

/// Runtime configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache capacity, in the same unit the stored values report (bytes)
    pub capacity: u64,
    /// TTL in seconds applied by the load driver, 0 = no expiration
    pub default_ttl: i64,
    /// Number of dispatch pool workers
    pub pool_workers: usize,
    /// Bounded queue length per worker
    pub pool_queue_size: usize,
    /// Number of operations the load driver submits
    pub workload_ops: usize,
    /// How long a submission may wait for queue room, in milliseconds.
    /// Negative waits forever, 0 never waits.
    pub submit_timeout_ms: i64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cache capacity in bytes (default: 64 MiB)
    /// - `DEFAULT_TTL` - TTL in seconds for driver writes (default: 300)
    /// - `POOL_WORKERS` - Dispatch pool workers (default: 4)
    /// - `POOL_QUEUE_SIZE` - Queue length per worker (default: 1024)
    /// - `WORKLOAD_OPS` - Operations submitted by the driver (default: 10000)
    /// - `SUBMIT_TIMEOUT_MS` - Submission timeout in milliseconds, negative = wait forever (default: 100)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl),
            pool_workers: env_or("POOL_WORKERS", defaults.pool_workers),
            pool_queue_size: env_or("POOL_QUEUE_SIZE", defaults.pool_queue_size),
            workload_ops: env_or("WORKLOAD_OPS", defaults.workload_ops),
            submit_timeout_ms: env_or("SUBMIT_TIMEOUT_MS", defaults.submit_timeout_ms),
        }
    }

    /// Submission timeout the load driver hands to the pool.
    pub fn submit_timeout(&self) -> SubmitTimeout {
        SubmitTimeout::from_millis(self.submit_timeout_ms)
    }

    /// Rejects settings the cache or pool cannot be built with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.pool_workers == 0 {
            return Err(CacheError::InvalidPoolSize(self.pool_workers));
        }
        if self.pool_queue_size == 0 {
            return Err(CacheError::InvalidQueueSize(self.pool_queue_size));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 64 * 1024 * 1024,
            default_ttl: 300,
            pool_workers: 4,
            pool_queue_size: 1024,
            workload_ops: 10_000,
            submit_timeout_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
