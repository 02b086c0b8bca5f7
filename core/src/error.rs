//! Error types for the rideem client.
//!
//! # Design
//! Only the propagating call path ever sees these values. `Task::get` collapses
//! every variant into the operation's default result, while `Task::call` and
//! `TaskHandle::wait` hand them to the caller unchanged.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `Task::call` and `TaskHandle::wait`.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP round trip failed before a response could be read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body was not a JSON object.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The worker pool was shut down before the task started.
    #[error("task cancelled before it started")]
    Cancelled,

    /// The task was submitted to a pool that had already been shut down.
    #[error("worker pool is shut down")]
    PoolShutdown,

    /// The task panicked on a worker thread.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// An environment override could not be parsed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
