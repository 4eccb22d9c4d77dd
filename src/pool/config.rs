//! Worker pool configuration

/// Configuration for a [`WkPool`](crate::pool::WkPool)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads, fixed for the pool's lifetime
    pub size: usize,
    /// Thread name prefix; workers are named `{prefix}-{id}`
    pub thread_name_prefix: String,
    /// Stack size for worker threads (None = platform default)
    pub stack_size: Option<usize>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: num_cpus::get(),
            thread_name_prefix: "wkpool-worker".to_string(),
            stack_size: None,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with the given number of workers
    ///
    /// A size of zero is accepted. Such a pool has no workers, so
    /// [`WkPool::submit`](crate::pool::WkPool::submit) blocks until the pool
    /// is stopped from another thread.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Set thread name prefix
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the stack size of each worker thread in bytes
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub(crate) fn thread_name(&self, id: usize) -> String {
        format!("{}-{}", self.thread_name_prefix, id)
    }
}
