//! Typed client for the recommendation service.
//!
//! # Design
//! `GorseClient` holds its base URL, API key, transport and logger, and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and, for list endpoints,
//! `parse_items` which decodes the response body. The [`Recommender`] impl
//! joins the two through [`execute`], so request construction and decoding
//! stay testable without a network.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{execute, HttpMethod, HttpRequest};
use crate::log::{Logger, NoopLogger};
use crate::transport::{Transport, UreqTransport};
use crate::types::{Feedback, Item, User};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Everything a caller can ask of the recommendation service.
pub trait Recommender {
    fn insert_item(&self, item: &Item) -> Result<(), ApiError>;
    fn insert_items(&self, items: &[Item]) -> Result<(), ApiError>;
    fn insert_user(&self, user: &User) -> Result<(), ApiError>;
    fn insert_users(&self, users: &[User]) -> Result<(), ApiError>;
    /// Sent as a one-element batch; the server sees the same request as
    /// `insert_feedbacks(&[feedback])`.
    fn insert_feedback(&self, feedback: &Feedback) -> Result<(), ApiError>;
    fn insert_feedbacks(&self, feedbacks: &[Feedback]) -> Result<(), ApiError>;
    fn get_recommend_items(&self, user_id: &str) -> Result<Vec<Item>, ApiError>;
    fn get_popular_items(&self, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError>;
    fn get_latest_items(&self, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError>;
    fn get_item_neighbors(&self, item_id: &str, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError>;
}

/// Blocking, stateless client for the recommendation API.
///
/// Cloning is cheap; clones share the transport's connection pool.
#[derive(Clone)]
pub struct GorseClient<T = UreqTransport> {
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
    transport: T,
    logger: Arc<dyn Logger>,
}

impl GorseClient<UreqTransport> {
    /// Store `base_url` and `api_key` verbatim. No network activity happens
    /// until the first operation.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_transport(base_url, api_key, UreqTransport::new())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(&config.base_url, &config.api_key);
        client.timeout = config.timeout;
        client
    }
}

impl<T: Transport> GorseClient<T> {
    pub fn with_transport(base_url: &str, api_key: &str, transport: T) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            timeout: None,
            transport,
            logger: Arc::new(NoopLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// A client whose calls are bounded by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        let mut req = HttpRequest::new(method, format!("{}{path}", self.base_url));
        if !self.api_key.is_empty() {
            req = req.header(API_KEY_HEADER, &self.api_key);
        }
        req.timeout = self.timeout;
        req
    }

    fn json_post<B: Serialize + ?Sized>(&self, path: &str, payload: &B) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            self.logger.error(&format!("encode {path}: {e}"));
            ApiError::Encoding(e)
        })?;
        Ok(self.request(HttpMethod::Post, path).body(body))
    }

    fn paged(&self, path: &str, offset: usize, limit: usize) -> HttpRequest {
        self.request(HttpMethod::Get, path)
            .param("offset", offset)
            .param("n", limit)
    }

    pub fn build_insert_item(&self, item: &Item) -> Result<HttpRequest, ApiError> {
        self.json_post("/api/item", item)
    }

    pub fn build_insert_items(&self, items: &[Item]) -> Result<HttpRequest, ApiError> {
        self.json_post("/api/items", items)
    }

    pub fn build_insert_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        self.json_post("/api/user", user)
    }

    pub fn build_insert_users(&self, users: &[User]) -> Result<HttpRequest, ApiError> {
        self.json_post("/api/users", users)
    }

    pub fn build_insert_feedback(&self, feedback: &Feedback) -> Result<HttpRequest, ApiError> {
        self.build_insert_feedbacks(std::slice::from_ref(feedback))
    }

    pub fn build_insert_feedbacks(&self, feedbacks: &[Feedback]) -> Result<HttpRequest, ApiError> {
        self.json_post("/api/feedback", feedbacks)
    }

    pub fn build_get_recommend_items(&self, user_id: &str) -> HttpRequest {
        let path = format!("/api/recommend/{}", urlencoding::encode(user_id));
        self.request(HttpMethod::Get, &path)
    }

    pub fn build_get_popular_items(&self, offset: usize, limit: usize) -> HttpRequest {
        self.paged("/api/popular", offset, limit)
    }

    pub fn build_get_latest_items(&self, offset: usize, limit: usize) -> HttpRequest {
        self.paged("/api/latest", offset, limit)
    }

    pub fn build_get_item_neighbors(&self, item_id: &str, offset: usize, limit: usize) -> HttpRequest {
        let path = format!("/api/neighbors/{}", urlencoding::encode(item_id));
        self.paged(&path, offset, limit)
    }

    /// Decode a JSON array of items, preserving the server's order.
    pub fn parse_items(&self, body: &[u8]) -> Result<Vec<Item>, ApiError> {
        serde_json::from_slice(body).map_err(|e| {
            self.logger.error(&format!("decode items: {e}"));
            ApiError::Decoding(e)
        })
    }

    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, ApiError> {
        execute(&self.transport, self.logger.as_ref(), request)
    }

    fn fetch_items(&self, request: &HttpRequest) -> Result<Vec<Item>, ApiError> {
        let body = self.send(request)?;
        self.parse_items(&body)
    }
}

impl<T: Transport> Recommender for GorseClient<T> {
    fn insert_item(&self, item: &Item) -> Result<(), ApiError> {
        self.send(&self.build_insert_item(item)?).map(drop)
    }

    fn insert_items(&self, items: &[Item]) -> Result<(), ApiError> {
        self.send(&self.build_insert_items(items)?).map(drop)
    }

    fn insert_user(&self, user: &User) -> Result<(), ApiError> {
        self.send(&self.build_insert_user(user)?).map(drop)
    }

    fn insert_users(&self, users: &[User]) -> Result<(), ApiError> {
        self.send(&self.build_insert_users(users)?).map(drop)
    }

    fn insert_feedback(&self, feedback: &Feedback) -> Result<(), ApiError> {
        self.insert_feedbacks(std::slice::from_ref(feedback))
    }

    fn insert_feedbacks(&self, feedbacks: &[Feedback]) -> Result<(), ApiError> {
        self.send(&self.build_insert_feedbacks(feedbacks)?).map(drop)
    }

    fn get_recommend_items(&self, user_id: &str) -> Result<Vec<Item>, ApiError> {
        self.fetch_items(&self.build_get_recommend_items(user_id))
    }

    fn get_popular_items(&self, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError> {
        self.fetch_items(&self.build_get_popular_items(offset, limit))
    }

    fn get_latest_items(&self, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError> {
        self.fetch_items(&self.build_get_latest_items(offset, limit))
    }

    fn get_item_neighbors(&self, item_id: &str, offset: usize, limit: usize) -> Result<Vec<Item>, ApiError> {
        self.fetch_items(&self.build_get_item_neighbors(item_id, offset, limit))
    }
}

impl<T> std::fmt::Debug for GorseClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GorseClient")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
