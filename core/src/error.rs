//! Error types for the recommendation API client.
//!
//! # Design
//! Each failure stage gets its own variant so callers can tell "the payload
//! never left the process" from "the server said no" from "the server answered
//! with something we could not read". A failed list fetch is always an `Err`,
//! never an empty `Vec`.

use std::fmt;

use thiserror::Error;

/// Opaque failure raised by a [`Transport`](crate::transport::Transport)
/// before any HTTP status was received.
#[derive(Debug)]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(source.into())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.0)
    }
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        Self::new(err)
    }
}

/// Errors returned by `GorseClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Connection refused, DNS failure, timeout, TLS failure or a request the
    /// transport could not construct.
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with a status other than 200.
    #[error("status code: {status}")]
    RemoteStatus { status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Decoding(#[source] serde_json::Error),
}

impl ApiError {
    /// The HTTP status the server returned, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RemoteStatus { status } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while loading a [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
