//! Fixed-size worker pool

use crate::core::{BoxedJob, ClosureJob, Job, Result, ThreadError};
use crate::pool::config::PoolConfig;
use crate::pool::worker::{Worker, WorkerState, WorkerStats, WorkerStatsSnapshot};
use crossbeam::channel::{self, select, Receiver, Sender, TrySendError};
use crossbeam_utils::sync::WaitGroup;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A fixed set of worker threads fed through one unbuffered job queue
///
/// # Handoff
///
/// The queue has no capacity. [`submit`](Self::submit) blocks until a worker
/// takes the job, so a busy pool pushes back on its callers instead of
/// buffering work. Each job goes to exactly one worker; which one is not
/// specified.
///
/// # Failure isolation
///
/// A job that panics is caught inside the worker that ran it, logged with
/// the worker id, and counted. The worker goes straight back to waiting for
/// the next job. Submitters never learn about the failure.
///
/// # Shutdown
///
/// [`stop`](Self::stop) first releases any submitter still waiting for a
/// worker, then signals every worker in turn, closes the queue and joins the
/// threads. Jobs already handed over run to completion. Calling it again is
/// a no-op, and submissions after it return [`ThreadError::ShuttingDown`].
pub struct WkPool {
    config: PoolConfig,
    workers: Vec<Worker>,
    jobs: RwLock<Option<Sender<BoxedJob>>>,
    // Keeps the queue connected for a pool without workers.
    _queue: Receiver<BoxedJob>,
    shutdown: Mutex<Option<Sender<()>>>,
    shutdown_signal: Receiver<()>,
    running: AtomicBool,
    total_jobs_submitted: AtomicU64,
}

impl std::fmt::Debug for WkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WkPool")
            .field("config", &self.config)
            .field("running", &self.running.load(Ordering::Relaxed))
            .field(
                "total_jobs_submitted",
                &self.total_jobs_submitted.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl WkPool {
    /// Create a pool with `size` workers
    ///
    /// Returns once every worker is waiting for jobs.
    pub fn new(size: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(size))
    }

    /// Create a pool with custom configuration
    ///
    /// Returns once every worker is waiting for jobs. If a worker thread
    /// cannot be spawned, the workers already started are stopped and
    /// joined before the error is returned.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let (jobs_tx, jobs_rx) = channel::bounded::<BoxedJob>(0);
        let (shutdown_tx, shutdown_rx) = channel::bounded::<()>(0);
        let ready = WaitGroup::new();

        let mut workers = Vec::with_capacity(config.size);
        for id in 0..config.size {
            match Worker::spawn(id, &config, jobs_rx.clone(), ready.clone()) {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    log::error!("worker pool construction failed: {}", e);
                    for worker in &workers {
                        worker.signal_stop();
                    }
                    for worker in &workers {
                        let _ = worker.join();
                    }
                    return Err(e);
                }
            }
        }

        ready.wait();

        log::debug!(
            "worker pool '{}' started with {} workers",
            config.thread_name_prefix,
            config.size
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_start(config.size);

        Ok(Self {
            config,
            workers,
            jobs: RwLock::new(Some(jobs_tx)),
            _queue: jobs_rx,
            shutdown: Mutex::new(Some(shutdown_tx)),
            shutdown_signal: shutdown_rx,
            running: AtomicBool::new(true),
            total_jobs_submitted: AtomicU64::new(0),
        })
    }

    /// Hand a job to the next free worker
    ///
    /// Blocks until a worker accepts the job and returns without waiting for
    /// it to run. On a pool with no workers this blocks until the pool is
    /// stopped from another thread.
    ///
    /// # Errors
    ///
    /// - `ThreadError::ShuttingDown` - the pool was stopped before a worker
    ///   took the job; the job is dropped without running
    pub fn submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        let jobs = self.job_sender()?;
        let job: BoxedJob = Box::new(job);

        select! {
            send(jobs, job) -> sent => sent.map_err(|_| ThreadError::shutting_down())?,
            recv(self.shutdown_signal) -> _ => return Err(ThreadError::shutting_down()),
        }

        self.record_submission();
        Ok(())
    }

    /// Submit a closure as a job
    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit(ClosureJob::new(f))
    }

    /// Attempts to hand over a job without blocking.
    ///
    /// Succeeds only if a worker is waiting at this instant.
    ///
    /// # Errors
    ///
    /// - `ThreadError::ShuttingDown` - the pool has been stopped
    /// - `ThreadError::PoolExhausted` - no worker is waiting for a job
    pub fn try_submit<J: Job + 'static>(&self, job: J) -> Result<()> {
        let jobs = self.job_sender()?;

        jobs.try_send(Box::new(job)).map_err(|e| match e {
            TrySendError::Full(_) => {
                let total = self.size();
                ThreadError::pool_exhausted(total - self.idle_workers().min(total), total)
            }
            TrySendError::Disconnected(_) => ThreadError::shutting_down(),
        })?;

        self.record_submission();
        Ok(())
    }

    /// Attempts to execute a closure without blocking.
    pub fn try_execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_submit(ClosureJob::new(f))
    }

    /// Hand a job to the next free worker, waiting at most `timeout`
    ///
    /// The timeout bounds only the wait for a worker. A job that has been
    /// handed over always runs to completion.
    ///
    /// # Errors
    ///
    /// - `ThreadError::ShuttingDown` - the pool was stopped before a worker
    ///   took the job
    /// - `ThreadError::SubmissionTimeout` - no worker took the job in time
    pub fn submit_timeout<J: Job + 'static>(&self, job: J, timeout: Duration) -> Result<()> {
        let jobs = self.job_sender()?;
        let job: BoxedJob = Box::new(job);

        select! {
            send(jobs, job) -> sent => sent.map_err(|_| ThreadError::shutting_down())?,
            recv(self.shutdown_signal) -> _ => return Err(ThreadError::shutting_down()),
            default(timeout) => {
                return Err(ThreadError::submission_timeout(timeout.as_millis() as u64))
            }
        }

        self.record_submission();
        Ok(())
    }

    /// Execute a closure, waiting at most `timeout` for a free worker
    pub fn execute_timeout<F>(&self, f: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_timeout(ClosureJob::new(f), timeout)
    }

    /// Submit a job that runs inside the caller's current tracing span
    #[cfg(feature = "tracing")]
    pub fn submit_traced<J: Job + 'static>(&self, job: J) -> Result<()> {
        self.submit(crate::tracing::TracedJob::new(job))
    }

    /// Stop the pool
    ///
    /// Submitters still waiting for a worker are released with
    /// `ThreadError::ShuttingDown`. Each worker is then signalled in id
    /// order; the signal is accepted only once the worker is idle, so jobs
    /// already handed over finish first. Finally the queue is closed and all
    /// worker threads are joined.
    ///
    /// Only the first call does any work; later calls return `Ok(())`
    /// immediately, even while the first call is still in progress.
    ///
    /// When called from inside a job (including by dropping the last handle
    /// to the pool there), the calling worker is neither signalled nor
    /// joined; it terminates after that job returns.
    ///
    /// # Errors
    ///
    /// - `ThreadError::JoinError` - a worker thread died outside of a job
    pub fn stop(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        // Disconnecting the signal wakes every blocked submitter
        drop(self.shutdown.lock().take());

        // A job stopping its own pool cannot wait for its own worker. That
        // worker exits on its own once the queue below is closed.
        let others = || self.workers.iter().filter(|w| !w.is_current_thread());

        for worker in others() {
            worker.signal_stop();
        }
        drop(self.jobs.write().take());

        let mut first_error = None;
        for worker in others() {
            if let Err(e) = worker.join() {
                log::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        log::debug!(
            "worker pool '{}' stopped ({} processed, {} panicked)",
            self.config.thread_name_prefix,
            self.total_jobs_processed(),
            self.total_jobs_panicked()
        );
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_pool_stop(
            self.total_jobs_processed(),
            self.total_jobs_panicked(),
        );

        first_error.map_or(Ok(()), Err)
    }

    /// Get the number of workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Check if the pool accepts jobs
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get the configuration the pool was built with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Get each worker's lifecycle state, indexed by worker id
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(Worker::state).collect()
    }

    /// Get the number of workers currently waiting for a job
    pub fn idle_workers(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.state() == WorkerState::Listening)
            .count()
    }

    /// Get statistics for all workers, indexed by worker id
    pub fn get_stats(&self) -> Vec<Arc<WorkerStats>> {
        self.workers.iter().map(Worker::stats).collect()
    }

    /// Copy every worker's state and counters
    pub fn stats_snapshot(&self) -> Vec<WorkerStatsSnapshot> {
        self.workers.iter().map(Worker::snapshot).collect()
    }

    /// Get total number of jobs handed to a worker
    pub fn total_jobs_submitted(&self) -> u64 {
        self.total_jobs_submitted.load(Ordering::Relaxed)
    }

    /// Get total number of jobs that ran to completion
    pub fn total_jobs_processed(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.stats().get_jobs_processed())
            .sum()
    }

    /// Get total number of jobs that panicked
    pub fn total_jobs_panicked(&self) -> u64 {
        self.workers
            .iter()
            .map(|w| w.stats().get_jobs_panicked())
            .sum()
    }

    fn job_sender(&self) -> Result<Sender<BoxedJob>> {
        if !self.running.load(Ordering::Acquire) {
            return Err(ThreadError::shutting_down());
        }
        self.jobs
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(ThreadError::shutting_down)
    }

    fn record_submission(&self) {
        self.total_jobs_submitted.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "tracing")]
        crate::tracing::metrics::record_submission(self.idle_workers());
    }
}

impl Drop for WkPool {
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            if let Err(e) = self.stop() {
                log::error!(
                    "failed to stop worker pool '{}' during drop: {}",
                    self.config.thread_name_prefix,
                    e
                );
            }
        }
    }
}
