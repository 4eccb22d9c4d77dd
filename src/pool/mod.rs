//! Worker pool and worker implementations

pub mod config;
pub mod wk_pool;
pub mod worker;

pub use config::PoolConfig;
pub use wk_pool::WkPool;
pub use worker::{Worker, WorkerState, WorkerStats, WorkerStatsSnapshot};
