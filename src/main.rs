//! LRU TTL Cache - load driver
//!
//! Runs a synthetic mixed workload against a cache through the dispatch
//! pool and logs the resulting statistics.

use std::sync::Arc;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lru_ttl_cache::{Config, DispatchPool, LruCache, SubmitTimeout};

/// Main entry point for the load driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the cache and start the dispatch pool
/// 4. Submit the workload (Ctrl+C stops it early)
/// 5. Drain the pool and log cache statistics
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lru_ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting LRU TTL cache load driver");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Configuration loaded: capacity={}, default_ttl={}s, workers={}, queue_size={}, ops={}",
        config.capacity,
        config.default_ttl,
        config.pool_workers,
        config.pool_queue_size,
        config.workload_ops
    );

    let cache: Arc<LruCache<String>> = Arc::new(LruCache::new(config.capacity)?);
    let mut pool = DispatchPool::new("workload", config.pool_workers, config.pool_queue_size)?;
    pool.start()?;

    let timeout = config.submit_timeout();
    info!(
        "Submitting {} operations to pool '{}' ({} workers)",
        config.workload_ops,
        pool.name(),
        pool.worker_count()
    );

    let rejected = tokio::select! {
        rejected = run_workload(&pool, &cache, &config, timeout) => rejected,
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, stopping workload early");
            0
        }
    };

    pool.stop().await;

    let stats = cache.stats();
    info!("Workload finished, {} submissions rejected", rejected);
    info!("Cache stats: {}", stats);
    info!("Cache hit rate: {:.2}%", stats.hit_rate() * 100.0);
    info!("Cache stats JSON: {}", stats.to_json());

    Ok(())
}

/// Submits `workload_ops` jobs and returns how many could not be queued.
async fn run_workload(
    pool: &DispatchPool,
    cache: &Arc<LruCache<String>>,
    config: &Config,
    timeout: SubmitTimeout,
) -> usize {
    let keyspace = (config.workload_ops / 4).max(1);
    let ttl = config.default_ttl;
    let mut rejected = 0;

    for i in 0..config.workload_ops {
        let cache = Arc::clone(cache);
        let key = format!("key-{}", i % keyspace);
        let value = "x".repeat(32 + i % 96);

        let queued = match i % 10 {
            0..=3 => pool.submit_with(move || cache.set_ex(key, value, ttl), timeout).await,
            4..=7 => {
                pool.submit_with(
                    move || {
                        cache.get(&key);
                    },
                    timeout,
                )
                .await
            }
            8 => pool.submit_with(move || cache.set_if_absent(key, value), timeout).await,
            _ => {
                pool.submit_with(
                    move || {
                        cache.delete(&key);
                    },
                    timeout,
                )
                .await
            }
        };

        if !queued {
            rejected += 1;
        }
    }

    rejected
}
