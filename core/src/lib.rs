//! Blocking client for a Gorse-style recommendation service.
//!
//! # Overview
//! Registers items, users and feedback, and fetches recommendation lists
//! (personalized, popular, latest, item neighbors) over HTTP with JSON
//! payloads.
//!
//! # Design
//! - `GorseClient` is stateless. It holds the base URL, API key, a
//!   [`Transport`] and an injected [`Logger`], all fixed at construction.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and a
//!   decode step, joined by [`http::execute`], so the I/O boundary is a
//!   single trait method.
//! - Callers depend on the [`Recommender`] trait, not the concrete client.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod log;
pub mod transport;
pub mod types;

pub use client::{GorseClient, Recommender, API_KEY_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{build_url, HttpMethod, HttpRequest, HttpResponse, ParamValue, QueryParams};
pub use log::{Logger, NoopLogger, TracingLogger};
pub use transport::{Transport, UreqTransport};
pub use types::{Feedback, Item, User};
