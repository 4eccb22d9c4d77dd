//! Tracing integration for observability.
//!
//! With the `tracing` feature enabled, workers run inside a `worker` span,
//! each job inside a `job_execution` span, and the [`metrics`] helpers emit
//! counter and gauge events.
//!
//! # Example
//!
//! ```rust,ignore
//! use wkpool::prelude::*;
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env()
//!         .add_directive("wkpool=debug".parse().unwrap()))
//!     .init();
//!
//! let pool = WkPool::new(4)?;
//! pool.submit_traced(|| println!("runs in the submitter's span"))?;
//! ```

use crate::core::Job;

/// A job wrapper that carries the submitter's tracing span to the worker.
///
/// The current span is captured when the wrapper is built and entered while
/// the inner job runs. Without the `tracing` feature it is a transparent
/// wrapper.
pub struct TracedJob<J: Job> {
    inner: J,
    #[cfg(feature = "tracing")]
    span: ::tracing::Span,
}

impl<J: Job> TracedJob<J> {
    /// Wrap a job, capturing the current span
    pub fn new(job: J) -> Self {
        Self {
            inner: job,
            #[cfg(feature = "tracing")]
            span: ::tracing::Span::current(),
        }
    }

    /// Wrap a job with a specific span
    #[cfg(feature = "tracing")]
    pub fn with_span(job: J, span: ::tracing::Span) -> Self {
        Self { inner: job, span }
    }
}

impl<J: Job> Job for TracedJob<J> {
    fn execute(self: Box<Self>) {
        #[cfg(feature = "tracing")]
        let TracedJob { inner, span } = *self;
        #[cfg(feature = "tracing")]
        let _guard = span.enter();
        #[cfg(not(feature = "tracing"))]
        let TracedJob { inner } = *self;

        Box::new(inner).execute()
    }

    fn job_type(&self) -> &str {
        self.inner.job_type()
    }
}

/// Metrics recording functions for observability.
///
/// These emit tracing events that a subscriber can turn into counters,
/// gauges and histograms.
#[cfg(feature = "tracing")]
pub mod metrics {
    use std::time::Duration;

    /// Records a job handoff.
    #[inline]
    pub fn record_submission(idle_workers: usize) {
        ::tracing::trace!(
            counter.jobs_submitted = 1,
            gauge.idle_workers = idle_workers as i64,
            "job submitted"
        );
    }

    /// Records a job that ran to completion.
    #[inline]
    pub fn record_completion(duration: Duration) {
        ::tracing::trace!(
            counter.jobs_completed = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job completed"
        );
    }

    /// Records a job panic event.
    #[inline]
    pub fn record_panic(duration: Duration) {
        ::tracing::trace!(
            counter.jobs_panicked = 1,
            histogram.job_duration_ms = duration.as_millis() as u64,
            "job panicked"
        );
    }

    /// Records worker becoming busy.
    #[inline]
    pub fn record_worker_busy(worker_id: usize) {
        ::tracing::trace!(gauge.workers_busy = 1, worker_id = worker_id, "worker busy");
    }

    /// Records worker becoming idle.
    #[inline]
    pub fn record_worker_idle(worker_id: usize) {
        ::tracing::trace!(
            gauge.workers_busy = -1i64,
            worker_id = worker_id,
            "worker idle"
        );
    }

    /// Records pool startup.
    #[inline]
    pub fn record_pool_start(num_workers: usize) {
        ::tracing::info!(workers = num_workers, "worker pool started");
    }

    /// Records pool shutdown.
    #[inline]
    pub fn record_pool_stop(jobs_processed: u64, jobs_panicked: u64) {
        ::tracing::info!(
            jobs_processed = jobs_processed,
            jobs_panicked = jobs_panicked,
            "worker pool stopped"
        );
    }
}
