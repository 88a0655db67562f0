//! A fixed-size pool of worker threads executing arbitrary closures from a
//! shared FIFO queue, with result handles, completion notifications and
//! explicit shutdown policies.
//!
//! ```no_run
//! use thread_orchestra::{ShutdownMode, WorkerPool};
//!
//! let pool = WorkerPool::new(4, "squares").unwrap();
//! let handles: Vec<_> = (0..10u64).map(|i| pool.submit(move || i * i).unwrap()).collect();
//! let total: u64 = handles.into_iter().map(|h| h.wait().unwrap()).sum();
//! assert_eq!(total, 285);
//! pool.shutdown(ShutdownMode::Drain);
//! ```
//!
//! Tasks must not block on other tasks submitted to the same pool: when every
//! worker is blocked that way the pool stalls for good.

mod config;
mod error;
mod handle;
mod manager;
mod notifier;
mod task;
mod task_queue;
mod worker;

pub use config::{PoolConfig, MIN_WORKERS};
pub use error::PoolError;
pub use handle::TaskHandle;
pub use manager::{Lifecycle, ShutdownMode, WorkerPool};
pub use notifier::{TaskCompletionInfo, TaskCompletionStatus};
