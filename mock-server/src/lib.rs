use std::{cmp::Reverse, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Feedback {
    pub feedback_type: String,
    pub user_id: String,
    pub item_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Affected {
    #[serde(rename = "RowAffected")]
    pub row_affected: usize,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_page_size")]
    pub n: usize,
}

fn default_page_size() -> usize {
    10
}

/// In-memory catalog. Items keep their first insertion position.
#[derive(Debug, Default)]
pub struct Store {
    items: Vec<Item>,
    users: HashMap<String, User>,
    feedback: Vec<Feedback>,
}

impl Store {
    fn upsert_item(&mut self, item: Item) {
        match self.items.iter_mut().find(|i| i.item_id == item.item_id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    fn upsert_user(&mut self, user: User) {
        self.users.insert(user.user_id.clone(), user);
    }
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Store>>,
    api_key: Option<Arc<str>>,
}

pub fn app() -> Router {
    app_with_key(None)
}

/// Like [`app`], but rejects requests whose `X-API-Key` does not match.
pub fn app_with_key(api_key: Option<String>) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Store::default())),
        api_key: api_key.map(Arc::from),
    };
    Router::new()
        .route("/api/item", post(insert_item))
        .route("/api/items", post(insert_items))
        .route("/api/user", post(insert_user))
        .route("/api/users", post(insert_users))
        .route("/api/feedback", post(insert_feedback))
        .route("/api/recommend/{user_id}", get(recommend))
        .route("/api/popular", get(popular))
        .route("/api/latest", get(latest))
        .route("/api/neighbors/{item_id}", get(neighbors))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: Option<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(expected) = state.api_key.as_deref() {
        let given = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            tracing::warn!(path = %request.uri().path(), "rejected request without valid api key");
            return Err(StatusCode::UNAUTHORIZED);
        }
    }
    Ok(next.run(request).await)
}

async fn insert_item(State(state): State<AppState>, Json(item): Json<Item>) -> Json<Affected> {
    state.db.write().await.upsert_item(item);
    Json(Affected { row_affected: 1 })
}

async fn insert_items(State(state): State<AppState>, Json(items): Json<Vec<Item>>) -> Json<Affected> {
    let mut db = state.db.write().await;
    let row_affected = items.len();
    for item in items {
        db.upsert_item(item);
    }
    Json(Affected { row_affected })
}

async fn insert_user(State(state): State<AppState>, Json(user): Json<User>) -> Json<Affected> {
    state.db.write().await.upsert_user(user);
    Json(Affected { row_affected: 1 })
}

async fn insert_users(State(state): State<AppState>, Json(users): Json<Vec<User>>) -> Json<Affected> {
    let mut db = state.db.write().await;
    let row_affected = users.len();
    for user in users {
        db.upsert_user(user);
    }
    Json(Affected { row_affected })
}

async fn insert_feedback(
    State(state): State<AppState>,
    Json(feedback): Json<Vec<Feedback>>,
) -> Json<Affected> {
    let row_affected = feedback.len();
    state.db.write().await.feedback.extend(feedback);
    Json(Affected { row_affected })
}

fn page(items: Vec<Item>, page: &Page) -> Vec<Item> {
    items.into_iter().skip(page.offset).take(page.n).collect()
}

async fn recommend(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Item>>, StatusCode> {
    let db = state.db.read().await;
    if !db.users.contains_key(&user_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let seen: Vec<&str> = db
        .feedback
        .iter()
        .filter(|fb| fb.user_id == user_id)
        .map(|fb| fb.item_id.as_str())
        .collect();
    let items = db
        .items
        .iter()
        .filter(|item| !seen.contains(&item.item_id.as_str()))
        .cloned()
        .collect();
    Ok(Json(items))
}

async fn popular(State(state): State<AppState>, Query(p): Query<Page>) -> Json<Vec<Item>> {
    let db = state.db.read().await;
    let mut items = db.items.clone();
    items.sort_by_key(|item| {
        Reverse(db.feedback.iter().filter(|fb| fb.item_id == item.item_id).count())
    });
    Json(page(items, &p))
}

async fn latest(State(state): State<AppState>, Query(p): Query<Page>) -> Json<Vec<Item>> {
    let db = state.db.read().await;
    let mut items = db.items.clone();
    items.sort_by_key(|item| Reverse(item.timestamp));
    Json(page(items, &p))
}

async fn neighbors(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Query(p): Query<Page>,
) -> Result<Json<Vec<Item>>, StatusCode> {
    let db = state.db.read().await;
    let target = db
        .items
        .iter()
        .find(|i| i.item_id == item_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let shared = |item: &Item| item.labels.iter().filter(|l| target.labels.contains(*l)).count();
    let mut items: Vec<Item> = db
        .items
        .iter()
        .filter(|i| i.item_id != item_id && shared(*i) > 0)
        .cloned()
        .collect();
    items.sort_by_key(|item| Reverse(shared(item)));
    Ok(Json(page(items, &p)))
}
