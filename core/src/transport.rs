//! One HTTP round trip, normalized into a `Response`.
//!
//! # Design
//! `Transport` is the seam to the HTTP client: it only moves bytes and may
//! fail. `round_trip` wraps any transport and guarantees the caller always
//! gets a `Response`; I/O and parse failures become the status-500 sentinel
//! and never escape.

use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Response};

/// Default global timeout for a single round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes a single HTTP request.
///
/// Implementations report non-2xx statuses as data, not errors. An `Err` is
/// reserved for failures where no response could be read at all.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Perform one round trip and decode the outcome.
pub fn round_trip(transport: &dyn Transport, request: &HttpRequest) -> Response {
    let response = match transport.send(request) {
        Ok(raw) => Response::decode(raw),
        Err(e) => Response::failed(e),
    };
    debug!(
        method = request.method.as_str(),
        url = %request.url,
        status = response.status,
        failed = response.is_failure(),
        "rideem round trip"
    );
    response
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl UreqTransport {
    /// Build an agent that returns 4xx/5xx responses as data and gives up on
    /// any round trip that takes longer than `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (key, value) in &request.headers {
                    builder = builder.header(key.as_str(), value.as_str());
                }
                builder.send_empty()
            }
        };
        let mut response = result.map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: (!body.is_empty()).then_some(body),
        })
    }
}
