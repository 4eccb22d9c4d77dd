//! Worker thread implementation

use crate::core::{BoxedJob, Result, ThreadError};
use crate::pool::config::PoolConfig;
use crossbeam::channel::{self, select, Receiver, Sender};
use crossbeam_utils::sync::WaitGroup;
use parking_lot::Mutex;
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

#[cfg(feature = "tracing")]
use ::tracing::{debug, span, Level};

/// Lifecycle state of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum WorkerState {
    /// Spawned, not yet inside its wait loop
    Ready = 0,
    /// Waiting for a job or a stop signal
    Listening = 1,
    /// Running a job
    Executing = 2,
    /// Loop exited; the worker never runs again
    Terminated = 3,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Ready,
            1 => WorkerState::Listening,
            2 => WorkerState::Executing,
            _ => WorkerState::Terminated,
        }
    }
}

#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(WorkerState::Ready as u8))
    }

    fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: WorkerState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Statistics for a worker thread
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Total number of jobs that ran to completion
    pub jobs_processed: AtomicU64,
    /// Total number of jobs that panicked
    pub jobs_panicked: AtomicU64,
    /// Total time spent running jobs (microseconds)
    pub total_processing_time_us: AtomicU64,
}

impl WorkerStats {
    /// Create new worker statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment jobs processed counter
    pub fn increment_processed(&self) {
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment jobs panicked counter
    pub fn increment_panicked(&self) {
        self.jobs_panicked.fetch_add(1, Ordering::Relaxed);
    }

    /// Add processing time
    pub fn add_processing_time(&self, microseconds: u64) {
        self.total_processing_time_us
            .fetch_add(microseconds, Ordering::Relaxed);
    }

    /// Get total jobs processed
    pub fn get_jobs_processed(&self) -> u64 {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    /// Get total jobs panicked
    pub fn get_jobs_panicked(&self) -> u64 {
        self.jobs_panicked.load(Ordering::Relaxed)
    }

    /// Get average run time per job (completed or panicked) in microseconds
    pub fn get_average_processing_time_us(&self) -> f64 {
        let total = self.total_processing_time_us.load(Ordering::Relaxed);
        let count = self.get_jobs_processed() + self.get_jobs_panicked();
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }
}

/// Point-in-time copy of one worker's state and counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerStatsSnapshot {
    /// Worker id
    pub worker_id: usize,
    /// State at the time of the snapshot
    pub state: WorkerState,
    /// Jobs that ran to completion
    pub jobs_processed: u64,
    /// Jobs that panicked
    pub jobs_panicked: u64,
    /// Average run time per job in microseconds
    pub average_processing_time_us: f64,
}

/// A worker thread that takes jobs from the pool's shared rendezvous queue
#[derive(Debug)]
pub struct Worker {
    id: usize,
    stop: Sender<()>,
    state: Arc<StateCell>,
    stats: Arc<WorkerStats>,
    thread_id: thread::ThreadId,
    thread: Mutex<Option<thread::JoinHandle<()>>>,
}

impl Worker {
    /// Spawn a worker thread
    ///
    /// The thread releases its clone of `ready` once it is inside its wait
    /// loop; the pool waits on the group before handing out work.
    pub(crate) fn spawn(
        id: usize,
        config: &PoolConfig,
        jobs: Receiver<BoxedJob>,
        ready: WaitGroup,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded(0);
        let state = Arc::new(StateCell::new());
        let stats = Arc::new(WorkerStats::new());

        let mut builder = thread::Builder::new().name(config.thread_name(id));
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread_state = Arc::clone(&state);
        let thread_stats = Arc::clone(&stats);
        let thread = builder
            .spawn(move || {
                Self::run(id, jobs, stop_rx, thread_state, thread_stats, ready);
            })
            .map_err(|e| ThreadError::spawn_with_source(id, "cannot spawn worker thread", e))?;

        Ok(Self {
            id,
            stop: stop_tx,
            state,
            stats,
            thread_id: thread.thread().id(),
            thread: Mutex::new(Some(thread)),
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Check whether the caller is running on this worker's thread
    pub(crate) fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Get the worker's current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    /// Get worker statistics
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Copy the worker's state and counters
    pub fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            worker_id: self.id,
            state: self.state(),
            jobs_processed: self.stats.get_jobs_processed(),
            jobs_panicked: self.stats.get_jobs_panicked(),
            average_processing_time_us: self.stats.get_average_processing_time_us(),
        }
    }

    /// Send this worker its stop signal
    ///
    /// Blocks until the worker is idle at its wait point, so a job it is
    /// running finishes first. Does nothing if the worker already exited.
    pub(crate) fn signal_stop(&self) {
        if self.stop.send(()).is_err() {
            log::debug!("worker {} already exited before stop signal", self.id);
        }
    }

    /// Join the worker thread
    pub(crate) fn join(&self) -> Result<()> {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|panic| ThreadError::join(self.id, panic_message(panic.as_ref())))?;
        }
        Ok(())
    }

    /// Main worker loop
    ///
    /// Waits on the shared job queue and the private stop channel at once;
    /// whichever is ready first wins. Exits on a stop signal or when the
    /// job queue is closed.
    fn run(
        id: usize,
        jobs: Receiver<BoxedJob>,
        stop: Receiver<()>,
        state: Arc<StateCell>,
        stats: Arc<WorkerStats>,
        ready: WaitGroup,
    ) {
        #[cfg(feature = "tracing")]
        let worker_span = span!(Level::DEBUG, "worker", id = id);
        #[cfg(feature = "tracing")]
        let _guard = worker_span.enter();

        state.set(WorkerState::Listening);
        drop(ready);

        #[cfg(feature = "tracing")]
        debug!("worker listening");

        loop {
            select! {
                recv(jobs) -> job => match job {
                    Ok(job) => {
                        state.set(WorkerState::Executing);
                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_worker_busy(id);

                        Self::execute_job(id, job, &stats);

                        #[cfg(feature = "tracing")]
                        crate::tracing::metrics::record_worker_idle(id);
                        state.set(WorkerState::Listening);
                    }
                    Err(_) => {
                        log::debug!("worker {} job queue closed", id);
                        break;
                    }
                },
                recv(stop) -> _ => break,
            }
        }

        state.set(WorkerState::Terminated);
        log::debug!(
            "worker {} terminated ({} processed, {} panicked)",
            id,
            stats.get_jobs_processed(),
            stats.get_jobs_panicked()
        );
    }

    /// Run a single job inside its own panic boundary
    fn execute_job(id: usize, job: BoxedJob, stats: &WorkerStats) {
        let job_type = job.job_type().to_owned();

        #[cfg(feature = "tracing")]
        let job_span = span!(Level::DEBUG, "job_execution", job_type = %job_type);
        #[cfg(feature = "tracing")]
        let _job_guard = job_span.enter();

        let start = Instant::now();
        let outcome = catch_unwind(AssertUnwindSafe(move || job.execute()));
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => {
                stats.increment_processed();
                #[cfg(feature = "tracing")]
                crate::tracing::metrics::record_completion(elapsed);
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                log::error!(
                    target: "wkpool::worker",
                    "worker {} recovered from panic in job '{}': {}",
                    id,
                    job_type,
                    message
                );
                #[cfg(feature = "tracing")]
                {
                    ::tracing::error!(panic_message = %message, "job panicked");
                    crate::tracing::metrics::record_panic(elapsed);
                }
                stats.increment_panicked();
            }
        }

        stats.add_processing_time(elapsed.as_micros() as u64);
    }
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use std::time::Duration;

    fn spawn_worker(id: usize) -> (Worker, Sender<BoxedJob>) {
        let (jobs_tx, jobs_rx) = channel::bounded(0);
        let ready = WaitGroup::new();
        let worker = Worker::spawn(id, &PoolConfig::new(1), jobs_rx, ready.clone())
            .expect("Failed to spawn worker");
        ready.wait();
        (worker, jobs_tx)
    }

    #[test]
    fn test_worker_creation() {
        let (worker, _jobs) = spawn_worker(7);
        assert_eq!(worker.id(), 7);
        assert_eq!(worker.state(), WorkerState::Listening);

        worker.signal_stop();
        worker.join().expect("Failed to join worker");
        assert_eq!(worker.state(), WorkerState::Terminated);
    }

    #[test]
    fn test_worker_job_execution() {
        let (worker, jobs) = spawn_worker(0);
        let stats = worker.stats();

        jobs.send(Box::new(ClosureJob::new(|| {})))
            .expect("Failed to send job");

        // The stop handoff only completes once the job has returned
        worker.signal_stop();
        worker.join().expect("Failed to join worker");

        assert_eq!(stats.get_jobs_processed(), 1);
        assert_eq!(stats.get_jobs_panicked(), 0);
    }

    #[test]
    fn test_worker_panic_handling() {
        let (worker, jobs) = spawn_worker(0);
        let stats = worker.stats();

        jobs.send(Box::new(ClosureJob::new(|| {
            panic!("Intentional panic for testing");
        })))
        .expect("Failed to send panicking job");

        // A rendezvous send succeeds only if the worker is still listening
        jobs.send_timeout(Box::new(ClosureJob::new(|| {})), Duration::from_secs(5))
            .expect("Worker did not survive the panic");

        worker.signal_stop();
        worker.join().expect("Failed to join worker");

        assert_eq!(stats.get_jobs_panicked(), 1);
        assert_eq!(stats.get_jobs_processed(), 1);
    }

    #[test]
    fn test_worker_exits_when_queue_closed() {
        let (worker, jobs) = spawn_worker(1);
        drop(jobs);
        worker.join().expect("Failed to join worker");
        assert_eq!(worker.state(), WorkerState::Terminated);
    }

    #[test]
    fn test_is_current_thread() {
        let (worker, jobs) = spawn_worker(3);
        assert!(!worker.is_current_thread());

        let worker = Arc::new(worker);
        let (seen_tx, seen_rx) = channel::bounded(1);
        let inner = Arc::clone(&worker);
        jobs.send(Box::new(move || {
            let _ = seen_tx.send(inner.is_current_thread());
        }))
        .expect("Failed to send job");

        assert!(seen_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Job never ran"));
        worker.signal_stop();
        worker.join().expect("Failed to join worker");
    }

    #[test]
    fn test_snapshot() {
        let (worker, jobs) = spawn_worker(2);
        jobs.send(Box::new(|| {})).expect("Failed to send job");
        worker.signal_stop();
        worker.join().expect("Failed to join worker");

        let snapshot = worker.snapshot();
        assert_eq!(snapshot.worker_id, 2);
        assert_eq!(snapshot.state, WorkerState::Terminated);
        assert_eq!(snapshot.jobs_processed, 1);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");

        let boxed: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(boxed.as_ref()), "Unknown panic");
    }
}
