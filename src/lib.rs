//! # wkpool
//!
//! A fixed-size worker pool. A fixed number of worker threads take jobs from
//! one shared, unbuffered queue and run them concurrently. A job that panics
//! is contained to that job: the worker logs it and keeps serving.
//!
//! ## Features
//!
//! - **Rendezvous handoff**: `submit` blocks until a worker takes the job
//! - **Readiness barrier**: construction returns once every worker listens
//! - **Per-job panic isolation**: panics are caught, logged and counted
//! - **Two-phase shutdown**: idempotent `stop`, defined errors afterwards
//! - **Worker statistics**: per-worker state and job counters
//!
//! ## Quick Start
//!
//! ```rust
//! use wkpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WkPool::new(4)?;
//!
//! for i in 0..10 {
//!     pool.execute(move || {
//!         println!("Job {} executing", i);
//!     })?;
//! }
//!
//! // Waits for accepted jobs, then terminates every worker
//! pool.stop()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Panic Isolation
//!
//! ```rust
//! use wkpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let pool = WkPool::new(1)?;
//! pool.submit(ClosureJob::with_name(|| panic!("boom"), "Flaky"))?;
//! pool.execute(|| println!("worker 0 is still alive"))?;
//! pool.stop()?;
//!
//! assert_eq!(pool.total_jobs_panicked(), 1);
//! assert_eq!(pool.total_jobs_processed(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use wkpool::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let config = PoolConfig::new(8).with_thread_name_prefix("my-worker");
//! let pool = WkPool::with_config(config)?;
//! # pool.stop()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod pool;
pub mod prelude;
pub mod tracing;

pub use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::pool::{PoolConfig, WkPool, WorkerState, WorkerStats, WorkerStatsSnapshot};
