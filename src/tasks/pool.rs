//! Dispatch Pool
//!
//! A named set of worker tasks, each draining its own bounded queue.
//! Submissions are spread round-robin across the workers.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{CacheError, Result};

/// Unit of work run by a pool worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

// == Submit Timeout ==
/// How long a submission may wait for room in a full queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTimeout {
    /// Give up at once if the queue is full
    Immediate,
    /// Wait until the queue has room
    Forever,
    /// Wait up to the given duration
    After(Duration),
}

impl SubmitTimeout {
    /// Maps a millisecond count: negative waits forever, zero never waits.
    pub fn from_millis(ms: i64) -> Self {
        match ms {
            ms if ms < 0 => SubmitTimeout::Forever,
            0 => SubmitTimeout::Immediate,
            ms => SubmitTimeout::After(Duration::from_millis(ms as u64)),
        }
    }
}

/// Timeout used by [`DispatchPool::submit`].
pub const DEFAULT_SUBMIT_TIMEOUT: SubmitTimeout =
    SubmitTimeout::After(Duration::from_millis(100));

// == Dispatch Pool ==
/// Round-robin pool of worker tasks with bounded per-worker queues.
///
/// Jobs run inline on the worker task, so they should be short and must not
/// block; a job that panics is logged and the worker moves on.
///
/// # Example
/// ```ignore
/// let mut pool = DispatchPool::new("writes", 4, 1024)?;
/// pool.start()?;
/// pool.submit(move || cache.set("k", "v".to_string())).await;
/// pool.stop().await;
/// ```
#[derive(Debug)]
pub struct DispatchPool {
    name: String,
    senders: Vec<mpsc::Sender<Job>>,
    receivers: Vec<mpsc::Receiver<Job>>,
    workers: Vec<JoinHandle<()>>,
    next: AtomicUsize,
}

impl DispatchPool {
    // == Constructor ==
    /// Creates a pool of `workers` queues, each holding up to `queue_size` jobs.
    ///
    /// Workers are not spawned until [`start`](Self::start); jobs submitted
    /// before that wait in their queue.
    pub fn new(name: impl Into<String>, workers: usize, queue_size: usize) -> Result<Self> {
        if workers == 0 {
            return Err(CacheError::InvalidPoolSize(workers));
        }
        if queue_size == 0 {
            return Err(CacheError::InvalidQueueSize(queue_size));
        }

        let (senders, receivers): (Vec<_>, Vec<_>) =
            (0..workers).map(|_| mpsc::channel::<Job>(queue_size)).unzip();

        Ok(Self {
            name: name.into(),
            senders,
            receivers,
            workers: Vec::with_capacity(workers),
            next: AtomicUsize::new(0),
        })
    }

    /// Name used in this pool's log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of queues, one per worker.
    pub fn worker_count(&self) -> usize {
        self.senders.len()
    }

    /// Jobs queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.senders
            .iter()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .sum()
    }

    // == Start ==
    /// Spawns the workers onto the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.receivers.is_empty() {
            return Err(CacheError::PoolAlreadyStarted(self.name.clone()));
        }

        for (id, rx) in self.receivers.drain(..).enumerate() {
            self.workers
                .push(tokio::spawn(run_worker(self.name.clone(), id, rx)));
        }

        info!(
            "Dispatch pool '{}' started with {} workers",
            self.name,
            self.workers.len()
        );
        Ok(())
    }

    // == Submit ==
    /// Queues a job, waiting at most [`DEFAULT_SUBMIT_TIMEOUT`] for room.
    pub async fn submit<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_with(job, DEFAULT_SUBMIT_TIMEOUT).await
    }

    /// Queues a job on the next worker in turn.
    ///
    /// Returns false if the queue stayed full for the whole timeout or the
    /// pool has been stopped.
    pub async fn submit_with<F>(&self, job: F, timeout: SubmitTimeout) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.senders.is_empty() {
            return false;
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        let sender = &self.senders[index];
        let job: Job = Box::new(job);

        match timeout {
            SubmitTimeout::Immediate => sender.try_send(job).is_ok(),
            SubmitTimeout::Forever => sender.send(job).await.is_ok(),
            SubmitTimeout::After(wait) => match tokio::time::timeout(wait, sender.send(job)).await {
                Ok(sent) => sent.is_ok(),
                Err(_) => {
                    error!(
                        "Dispatch pool '{}' worker {} submit timed out after {:?}",
                        self.name, index, wait
                    );
                    false
                }
            },
        }
    }

    // == Stop ==
    /// Closes every queue and waits for the workers to finish what is queued.
    ///
    /// Jobs queued on a pool that was never started are dropped.
    pub async fn stop(&mut self) {
        self.senders.clear();
        self.receivers.clear();

        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                warn!("Dispatch pool '{}' worker ended abnormally: {}", self.name, e);
            }
        }

        info!("Dispatch pool '{}' stopped", self.name);
    }
}

async fn run_worker(pool: String, id: usize, mut rx: mpsc::Receiver<Job>) {
    debug!("Dispatch pool '{}' worker {} running", pool, id);

    while let Some(job) = rx.recv().await {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            warn!("Dispatch pool '{}' worker {} recovered from a panicking job", pool, id);
        }
    }

    debug!("Dispatch pool '{}' worker {} drained", pool, id);
}
