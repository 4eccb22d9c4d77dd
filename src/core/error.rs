//! Error types for the worker pool

/// Result type for worker pool operations
pub type Result<T> = std::result::Result<T, ThreadError>;

/// Errors that can occur in the worker pool
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ThreadError {
    /// The pool has been stopped or is stopping
    #[error("Worker pool is shutting down")]
    ShuttingDown,

    /// Failed to spawn a worker thread with details
    #[error("Failed to spawn worker thread #{thread_id}: {message}")]
    SpawnError {
        /// ID of the worker that failed to spawn
        thread_id: usize,
        /// Error message
        message: String,
        /// Source IO error
        #[source]
        source: Option<std::io::Error>,
    },

    /// Failed to join a worker thread
    #[error("Failed to join worker thread #{thread_id}: {message}")]
    JoinError {
        /// ID of the worker that failed to join
        thread_id: usize,
        /// Error message
        message: String,
    },

    /// Job submission timed out waiting for a free worker
    #[error("Job submission timed out after {timeout_ms}ms")]
    SubmissionTimeout {
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// No worker was idle for a non-blocking submission
    #[error("Worker pool exhausted: {busy}/{total} workers busy")]
    PoolExhausted {
        /// Number of workers not waiting for a job
        busy: usize,
        /// Total number of workers
        total: usize,
    },
}

impl ThreadError {
    /// Create a shutting down error
    pub fn shutting_down() -> Self {
        ThreadError::ShuttingDown
    }

    /// Create a spawn error with source
    pub fn spawn_with_source(
        thread_id: usize,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        ThreadError::SpawnError {
            thread_id,
            message: message.into(),
            source: Some(source),
        }
    }

    /// Create a join error
    pub fn join(thread_id: usize, message: impl Into<String>) -> Self {
        ThreadError::JoinError {
            thread_id,
            message: message.into(),
        }
    }

    /// Create a submission timeout error
    pub fn submission_timeout(timeout_ms: u64) -> Self {
        ThreadError::SubmissionTimeout { timeout_ms }
    }

    /// Create a pool exhausted error
    pub fn pool_exhausted(busy: usize, total: usize) -> Self {
        ThreadError::PoolExhausted { busy, total }
    }
}
