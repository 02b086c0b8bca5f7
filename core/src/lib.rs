//! Blocking client for the rideem promo-code API.
//!
//! # Overview
//! Every API method on `Rideem` returns a `Task` instead of doing any I/O.
//! The caller decides where, when, and how it runs: `get` it immediately off
//! a latency-sensitive thread, keep it for later, or `spawn` it on the
//! client's worker pool and wait on the `TaskHandle`.
//!
//! # Design
//! - `Task::get` collapses failures into a default value; `Task::call` and
//!   `TaskHandle::wait` return them as `Error`.
//! - Tasks are never memoized. Each execution performs a fresh round trip.
//! - The `Transport` trait isolates the HTTP client; `round_trip` turns any
//!   I/O or parse failure into a status-500 `Response` instead of an error.
//! - The worker pool is created lazily, once per client, behind a mutex.
//!
//! ```no_run
//! use rideem::Rideem;
//!
//! let rideem = Rideem::new().with_key("app-secret");
//! let code = rideem.from("my-app").get();
//! if code.is_empty() {
//!     println!("no code, try again in {}s", code.delay);
//! }
//!
//! let pending = rideem.spawn(rideem.request("my-app"));
//! let count = pending.wait();
//! rideem.shutdown();
//! # let _ = count;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pool;
pub mod task;
pub mod transport;
pub mod types;

pub use client::Rideem;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Response};
pub use pool::{TaskHandle, WorkerPool};
pub use task::Task;
pub use transport::{round_trip, Transport, UreqTransport};
pub use types::{parse_count, Code};
