//! Convenient re-exports for common types and traits

pub use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
pub use crate::pool::{PoolConfig, WkPool, WorkerState, WorkerStats, WorkerStatsSnapshot};
