//! Request descriptors and the single-request executor.
//!
//! # Design
//! An `HttpRequest` describes one outgoing call as plain data: method, base
//! URL, typed query parameters, body bytes, headers and an optional timeout.
//! `execute` resolves it into a concrete URL and header set, hands it to a
//! [`Transport`] for exactly one round-trip, and turns anything other than a
//! 200 into an `ApiError`. Decoding the body is left to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ApiError;
use crate::log::Logger;
use crate::transport::Transport;

/// Content type applied to non-GET requests that do not set one explicitly.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(u64),
    Str(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(n) => write!(f, "{n}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<u64> for ParamValue {
    fn from(n: u64) -> Self {
        ParamValue::Int(n)
    }
}

impl From<usize> for ParamValue {
    fn from(n: usize) -> Self {
        ParamValue::Int(n as u64)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

/// Query parameters, emitted in key order.
pub type QueryParams = BTreeMap<String, ParamValue>;

/// An HTTP request described as plain data.
///
/// Built by `GorseClient::build_*` methods and passed to [`execute`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: QueryParams,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: QueryParams::new(),
            body: None,
            content_type: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// The full target URL, query string included.
    pub fn target(&self) -> String {
        build_url(&self.url, &self.params)
    }

    /// Content type to send: the explicit one, or JSON for anything but GET.
    pub fn effective_content_type(&self) -> Option<&str> {
        match self.content_type.as_deref() {
            Some("") => None,
            Some(ct) => Some(ct),
            None if self.method != HttpMethod::Get => Some(JSON_CONTENT_TYPE),
            None => None,
        }
    }

    /// Headers to send, with `content-type` last so it overrides any
    /// duplicate set through `headers`.
    pub fn effective_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("content-type"))
            .cloned()
            .collect();
        if let Some(ct) = self.effective_content_type() {
            headers.push(("content-type".to_string(), ct.to_string()));
        }
        headers
    }
}

/// An HTTP response described as plain data, as returned by a `Transport`.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Append `params` to `base` as a percent-encoded query string.
///
/// Returns `base` unchanged when `params` is empty. A `?` is inserted unless
/// `base` already ends in `?` or `&`.
pub fn build_url(base: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return base.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&value.to_string())
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    if base.ends_with('?') || base.ends_with('&') {
        format!("{base}{query}")
    } else {
        format!("{base}?{query}")
    }
}

/// Perform one round-trip for `request` and return the raw body on HTTP 200.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    logger: &dyn Logger,
    request: &HttpRequest,
) -> Result<Vec<u8>, ApiError> {
    let target = request.target();
    logger.debug(&format!("{} {target}", request.method));

    let response = transport.round_trip(request).map_err(|err| {
        logger.error(&format!("{} {target}: {err}", request.method));
        ApiError::Transport(err)
    })?;

    logger.debug(&format!(
        "{} {target} -> {} ({} bytes)",
        request.method,
        response.status,
        response.body.len()
    ));
    check_status(&response).inspect_err(|err| {
        logger.error(&format!("{} {target}: {err}", request.method));
    })?;
    Ok(response.body)
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 200 {
        return Ok(());
    }
    Err(ApiError::RemoteStatus {
        status: response.status,
    })
}
