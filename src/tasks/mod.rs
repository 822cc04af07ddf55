//! Background Tasks Module
//!
//! Worker tasks that run cache operations off the caller's task.
//!
//! # Tasks
//! - Dispatch pool: round-robin workers with bounded queues

mod pool;

pub use pool::{DispatchPool, Job, SubmitTimeout, DEFAULT_SUBMIT_TIMEOUT};
