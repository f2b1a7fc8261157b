//! The I/O boundary: turning an `HttpRequest` into an `HttpResponse`.
//!
//! Everything above this trait is deterministic. `UreqTransport` is the
//! blocking default; tests and embedders can plug in their own.

use std::time::Duration;

use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes exactly one HTTP round-trip.
///
/// Implementations must return every status code as data. Only failures
/// that prevent a response from being received are errors.
pub trait Transport {
    fn round_trip(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a shared `ureq::Agent`.
///
/// The agent pools connections internally and is cheap to clone. Response
/// bodies are read in full; `with_body_limit` caps them.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
    body_limit: u64,
}

impl UreqTransport {
    /// A transport with no global timeout.
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// A transport whose calls are bounded by `timeout` unless the request
    /// carries its own.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            body_limit: u64::MAX,
        }
    }

    /// Reject response bodies longer than `limit` bytes as transport errors.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    fn prepare<B>(&self, mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
        for (name, value) in request.effective_headers() {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.config().timeout_global(Some(timeout)).build();
        }
        builder
    }

    fn read_response(&self, mut response: Response<Body>) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.body_limit)
            .read_to_vec()?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    /// The body is drained completely; the connection is released when the
    /// response drops, on success or failure.
    fn round_trip(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let target = request.target();
        let response = match request.method {
            HttpMethod::Get => self.prepare(self.agent.get(&target), request).call()?,
            HttpMethod::Post => {
                let builder = self.prepare(self.agent.post(&target), request);
                match &request.body {
                    Some(body) => builder.send(body.as_slice())?,
                    None => builder.send_empty()?,
                }
            }
        };
        self.read_response(response)
    }
}
