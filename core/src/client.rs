//! The rideem API client.
//!
//! # Design
//! `Rideem` never touches the network itself. Each operation method builds a
//! `Task` that captures a finished `HttpRequest` and the shared transport;
//! the round trip happens only when the task is executed. Request building
//! and payload parsing are also exposed on their own so the I/O boundary
//! stays visible.
//!
//! Configuration is set with consuming `with_*` methods before the client is
//! shared. The worker pool is the one piece of shared mutable state: it is
//! created on the first `spawn` behind a mutex, or supplied up front.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest};
use crate::pool::{lock, TaskHandle, WorkerPool};
use crate::task::Task;
use crate::transport::{round_trip, Transport, UreqTransport};
use crate::types::{parse_count, Code};

/// Client for the rideem promo-code API.
pub struct Rideem {
    host: String,
    key: Option<String>,
    pool_size: usize,
    pool: Mutex<Option<Arc<WorkerPool>>>,
    transport: Arc<dyn Transport>,
}

impl Default for Rideem {
    fn default() -> Self {
        Self::from_config(ClientConfig::default())
    }
}

impl std::fmt::Debug for Rideem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rideem")
            .field("host", &self.host)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("pool_size", &self.pool_size)
            .finish_non_exhaustive()
    }
}

impl Rideem {
    /// A client for `https://rideem.io` with no app key.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            host: trim_host(config.host),
            key: config.key,
            pool_size: config.pool_size,
            pool: Mutex::new(None),
            transport: Arc::new(UreqTransport::new(config.timeout)),
        }
    }

    /// Set the base URL, including scheme.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = trim_host(host.into());
        self
    }

    /// Set the app secret key used by redeem calls that don't pass one.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Use `pool` for `spawn` instead of creating one lazily.
    pub fn with_pool(self, pool: Arc<WorkerPool>) -> Self {
        *lock(&self.pool) = Some(pool);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// The pool used by `spawn`, if one exists yet.
    pub fn worker_pool(&self) -> Option<Arc<WorkerPool>> {
        lock(&self.pool).clone()
    }

    // -----------------------------------------------------------------------
    // Request building
    // -----------------------------------------------------------------------

    /// `GET {host}/rideem/from/{app}[/for/{promo}][?key={key}]`.
    ///
    /// An explicit `key` wins over the configured one; with neither, no key
    /// parameter is sent.
    pub fn build_from(&self, app: &str, promo: Option<&str>, key: Option<&str>) -> HttpRequest {
        let mut url = format!("{}/rideem/from/{app}", self.host);
        if let Some(promo) = promo {
            url.push_str("/for/");
            url.push_str(promo);
        }
        if let Some(key) = key.or(self.key.as_deref()) {
            url.push_str("?key=");
            url.push_str(key);
        }
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: json_headers(),
        }
    }

    /// `POST {host}/rideem/request/{app}`.
    pub fn build_request(&self, app: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: format!("{}/rideem/request/{app}", self.host),
            headers: json_headers(),
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Redeem a code from the app's default promotion.
    pub fn from(&self, app: &str) -> Task<Code> {
        self.redeem(app, None, None)
    }

    /// Redeem a code from a named promotion.
    pub fn from_promo(&self, app: &str, promo: &str) -> Task<Code> {
        self.redeem(app, Some(promo), None)
    }

    /// Redeem a code, optionally from a named or private promotion.
    pub fn redeem(&self, app: &str, promo: Option<&str>, key: Option<&str>) -> Task<Code> {
        let request = self.build_from(app, promo, key);
        let transport = Arc::clone(&self.transport);
        let label = match promo {
            Some(promo) => format!("from {app} for {promo}"),
            None => format!("from {app}"),
        };
        Task::new(label, move || {
            let payload = round_trip(&*transport, &request).into_payload()?;
            Ok(Code::from_payload(&payload))
        })
    }

    /// Post a request for `app`; the task yields the app's request count.
    pub fn request(&self, app: &str) -> Task<i64> {
        let request = self.build_request(app);
        let transport = Arc::clone(&self.transport);
        Task::new(format!("request {app}"), move || {
            let payload = round_trip(&*transport, &request).into_payload()?;
            Ok(parse_count(&payload))
        })
    }

    // -----------------------------------------------------------------------
    // Background dispatch
    // -----------------------------------------------------------------------

    /// Run `task` on the worker pool, creating the pool on first use.
    ///
    /// The handle reports failures instead of defaulting them. After
    /// `shutdown` every handle resolves to `Error::PoolShutdown`.
    pub fn spawn<T: Send + 'static>(&self, task: Task<T>) -> TaskHandle<T> {
        let pool = {
            let mut slot = lock(&self.pool);
            match slot.as_ref() {
                Some(pool) => Arc::clone(pool),
                None => match WorkerPool::new(self.pool_size) {
                    Ok(pool) => Arc::clone(slot.insert(Arc::new(pool))),
                    Err(e) => return TaskHandle::ready(Err(e)),
                },
            }
        };
        debug!(task = task.label(), "dispatching to worker pool");
        pool.submit(task)
    }

    /// Shut down the worker pool, cancelling work that has not started.
    /// No-op if `spawn` was never used and no pool was supplied.
    pub fn shutdown(&self) {
        if let Some(pool) = self.worker_pool() {
            pool.shutdown();
        }
    }
}

fn trim_host(host: String) -> String {
    host.trim_end_matches('/').to_string()
}

fn json_headers() -> Vec<(String, String)> {
    vec![("accept".to_string(), "application/json".to_string())]
}
