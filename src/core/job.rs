//! Job trait and related types

use std::fmt;

/// A fire-and-forget unit of work executed by one pool worker
///
/// Jobs produce side effects only; nothing is reported back to the
/// submitter. Any `FnOnce() + Send + 'static` closure is a job.
pub trait Job: Send {
    /// Run the job, consuming it
    fn execute(self: Box<Self>);

    /// Get the job's type name for diagnostics
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl<F> Job for F
where
    F: FnOnce() + Send,
{
    fn execute(self: Box<Self>) {
        (*self)()
    }

    fn job_type(&self) -> &str {
        "Closure"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

/// A closure job carrying a name that shows up in panic diagnostics
pub struct ClosureJob<F>
where
    F: FnOnce() + Send,
{
    closure: F,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self::with_name(closure, "ClosureJob")
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure,
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() + Send,
{
    fn execute(self: Box<Self>) {
        let ClosureJob { closure, .. } = *self;
        closure()
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}
