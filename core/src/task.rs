//! Deferred, repeatable units of work.
//!
//! # Design
//! A `Task` wraps a computation without running it. The caller picks how it
//! runs: `get` blocks and collapses every failure into `T::default()`, `call`
//! blocks and returns the failure, `run` blocks and discards everything.
//! Nothing is cached; each invocation performs the computation again.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;

type Op<T> = dyn Fn() -> Result<T> + Send + Sync;

/// A deferred computation producing `T`.
///
/// Cloning is cheap and shares the same computation, so a task can be kept
/// for later, handed to a `WorkerPool`, and still be run locally.
pub struct Task<T> {
    label: Arc<str>,
    op: Arc<Op<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            op: Arc::clone(&self.op),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish_non_exhaustive()
    }
}

impl<T> Task<T> {
    /// Wrap `op`. `label` names the task in log records.
    pub fn new<F>(label: impl Into<Arc<str>>, op: F) -> Self
    where
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            op: Arc::new(op),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run on the calling thread and return the failure, if any.
    ///
    /// Blocks for the whole network round trip.
    pub fn call(&self) -> Result<T> {
        (self.op)()
    }

    /// Run on the calling thread, returning `T::default()` on any failure.
    ///
    /// Blocks for the whole network round trip. The failure is logged and
    /// otherwise lost; use `call` when the caller needs it.
    pub fn get(&self) -> T
    where
        T: Default,
    {
        match self.call() {
            Ok(value) => value,
            Err(e) => {
                warn!(task = %self.label, error = %e, "task failed, returning default");
                T::default()
            }
        }
    }

    /// Run on the calling thread and discard the result.
    pub fn run(&self) {
        if let Err(e) = self.call() {
            warn!(task = %self.label, error = %e, "task failed");
        }
    }
}
