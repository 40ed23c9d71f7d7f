//! # HTTP API
//!
//! Axum router exposing search and saved-search management as JSON.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{
    application::{SavedSearchService, SearchService},
    domain::{DomainError, Filters, NotificationPatch, Notifications, QuerySpec, SavedSearch, SearchResult},
};

pub struct AppState {
    pub search: Arc<SearchService>,
    pub saved: Arc<SavedSearchService>,
}

type ApiError = (StatusCode, Json<Value>);

fn api_error(e: DomainError) -> ApiError {
    let status = match e {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Catalog(_) | DomainError::Notification(_) => StatusCode::BAD_GATEWAY,
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    }
    (status, Json(json!({ "error": e.to_string() })))
}

#[derive(Debug, Deserialize)]
pub struct CreateSavedSearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub filters: Filters,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/search", post(search))
        .route("/api/saved", get(list_saved).post(create_saved))
        .route("/api/saved/:id", delete(delete_saved))
        .route("/api/saved/:id/notifications", patch(patch_notifications))
        .route("/api/saved/:id/run", post(run_saved))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "time": Utc::now().to_rfc3339() }))
}

/// Always answers 200; catalog problems surface in the `error` field.
async fn search(State(state): State<Arc<AppState>>, Json(spec): Json<QuerySpec>) -> Json<SearchResult> {
    Json(state.search.search(&spec).await)
}

async fn list_saved(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SavedSearch>>, ApiError> {
    state.saved.list().await.map(Json).map_err(api_error)
}

async fn create_saved(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSavedSearchRequest>,
) -> Result<Json<SavedSearch>, ApiError> {
    state
        .saved
        .create(req.query.unwrap_or_default(), req.filters)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn delete_saved(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.saved.delete(&id).await.map_err(api_error)?;
    Ok(Json(json!({ "ok": true })))
}

async fn patch_notifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<NotificationPatch>,
) -> Result<Json<Notifications>, ApiError> {
    state
        .saved
        .patch_notifications(&id, &patch)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn run_saved(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SearchResult>, ApiError> {
    state.saved.replay(&id).await.map(Json).map_err(api_error)
}
