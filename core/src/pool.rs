//! Fixed-size worker pool for running tasks in the background.
//!
//! # Design
//! Workers are named OS threads pulling from one unbounded crossbeam queue,
//! so submissions beyond the pool size wait their turn instead of failing.
//! Each submission gets a one-slot result channel; the `TaskHandle` on the
//! other end is the caller's future. Every queued job resolves its handle
//! exactly once: with the task's own result, with `Error::Cancelled` when the
//! pool shut down first, or with `Error::Panicked`.
//!
//! Shutdown closes the queue, cancels everything still waiting in it, and
//! lets running tasks finish. A blocking round trip cannot be interrupted;
//! the transport timeout bounds how long it may run on.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::task::Task;

/// Number of workers used when none is configured.
pub const DEFAULT_POOL_SIZE: usize = 10;

/// A queued unit of work and the way to resolve it without running it.
struct Job {
    run: Box<dyn FnOnce() + Send>,
    cancel: Box<dyn FnOnce() + Send>,
}

/// A fixed set of worker threads shared by every background dispatch.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    queue: Receiver<Job>,
    shut_down: Arc<AtomicBool>,
    size: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size)
            .field("queued", &self.queue.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl WorkerPool {
    /// Start `size` worker threads.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidConfig("worker pool size must be at least 1".to_string()));
        }

        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let shut_down = Arc::new(AtomicBool::new(false));

        for worker_id in 0..size {
            let rx = rx.clone();
            let shut_down = Arc::clone(&shut_down);
            thread::Builder::new()
                .name(format!("rideem-worker-{worker_id}"))
                .spawn(move || worker_loop(rx, shut_down))?;
        }

        info!(size, "worker pool started");
        Ok(Self {
            sender: Mutex::new(Some(tx)),
            queue: rx,
            shut_down,
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of submissions waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Queue `task.call()` and return a handle to its result.
    ///
    /// After `shutdown` the handle resolves to `Error::PoolShutdown`.
    pub fn submit<T: Send + 'static>(&self, task: Task<T>) -> TaskHandle<T> {
        let (result_tx, result_rx) = crossbeam_channel::bounded(1);
        let cancel_tx = result_tx.clone();
        let label = task.label().to_string();

        let job = Job {
            run: Box::new(move || {
                let result = catch_unwind(AssertUnwindSafe(|| task.call()))
                    .unwrap_or_else(|panic| Err(Error::Panicked(panic_message(&*panic))));
                let _ = result_tx.send(result);
            }),
            cancel: Box::new(move || {
                let _ = cancel_tx.send(Err(Error::Cancelled));
            }),
        };

        let guard = lock(&self.sender);
        let Some(sender) = guard.as_ref() else {
            return TaskHandle::ready(Err(Error::PoolShutdown));
        };
        if let Err(rejected) = sender.send(job) {
            (rejected.0.cancel)();
        } else {
            debug!(task = %label, "task submitted");
        }

        TaskHandle { rx: result_rx }
    }

    /// Close the queue and cancel every submission that has not started.
    ///
    /// Running tasks are left to finish. Calling this more than once is a no-op.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        drop(lock(&self.sender).take());

        let mut cancelled = 0usize;
        while let Ok(job) = self.queue.try_recv() {
            (job.cancel)();
            cancelled += 1;
        }
        info!(cancelled, "worker pool shut down");
    }
}

fn worker_loop(rx: Receiver<Job>, shut_down: Arc<AtomicBool>) {
    while let Ok(job) = rx.recv() {
        if shut_down.load(Ordering::Acquire) {
            (job.cancel)();
        } else {
            (job.run)();
        }
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The pending result of a task submitted to a `WorkerPool`.
///
/// Unlike `Task::get`, failures are not swallowed: `wait` yields the error
/// the task produced, or `Error::Cancelled` if it never ran.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// A handle that is already resolved.
    pub(crate) fn ready(result: Result<T>) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _ = tx.send(result);
        Self { rx }
    }

    /// True once the outcome is available.
    pub fn is_finished(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Block until the task has finished.
    pub fn wait(self) -> Result<T> {
        self.rx.recv().unwrap_or(Err(Error::Cancelled))
    }

    /// Block for at most `timeout`; hands the handle back if still pending.
    pub fn wait_timeout(self, timeout: Duration) -> std::result::Result<Result<T>, Self> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Ok(result),
            Err(RecvTimeoutError::Disconnected) => Ok(Err(Error::Cancelled)),
            Err(RecvTimeoutError::Timeout) => Err(self),
        }
    }

    /// Take the outcome if it is ready; hands the handle back otherwise.
    pub fn try_wait(self) -> std::result::Result<Result<T>, Self> {
        match self.rx.try_recv() {
            Ok(result) => Ok(result),
            Err(TryRecvError::Disconnected) => Ok(Err(Error::Cancelled)),
            Err(TryRecvError::Empty) => Err(self),
        }
    }
}
