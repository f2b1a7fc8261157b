//! Domain DTOs for the recommendation API.
//!
//! # Design
//! Field names go over the wire in PascalCase (`ItemId`, `FeedbackType`, ...)
//! because that is the shape the service accepts and returns. Timestamps are
//! RFC 3339 strings. The mock-server crate defines its own copies of these
//! types; integration tests catch any schema drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Lists may arrive as `null` when the server never set them.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A catalog entity that can be recommended to users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

/// An entity that receives recommendations and generates feedback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub subscribe: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

/// A timestamped event linking a user to an item, e.g. `"like"` or `"read"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Feedback {
    pub feedback_type: String,
    pub user_id: String,
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comment: String,
}
