//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::cache::{ImportOptions, MemoryCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DebugRequest, DebugResponse, DeleteResponse, ExpiredQuery, ExpiredResponse, GetResponse,
    HasResponse, HealthResponse, ImportResponse, MessageResponse, PutRequest, PutResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache is a cloneable handle with its own internal locking.
#[derive(Clone)]
pub struct AppState {
    /// Cache of arbitrary JSON values
    pub cache: MemoryCache<Value>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: MemoryCache<Value>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Must run inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = MemoryCache::new(config.cache_config())?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /put
///
/// Stores a key-value pair with the cache's default TTL.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let value = state.cache.put(req.key.clone(), req.value)?;

    Ok(Json(PutResponse::new(req.key, value)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value; expired entries are purged and reported as 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let present = state.cache.has(&key);
    Json(HasResponse { key, present })
}

/// Handler for DELETE /del/:key
///
/// Absent and already-expired keys are reported as 404.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.del(&key) {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear();
    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for GET /expired/:key?threshold=<secs>
pub async fn expired_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ExpiredQuery>,
) -> Json<ExpiredResponse> {
    let expired = state.cache.expired(&key, query.threshold);
    Json(ExpiredResponse { key, expired })
}

/// Handler for GET /stats
///
/// Returns hit/miss counters alongside both size measures.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;

    Json(StatsResponse::new(
        cache.stats(),
        cache.size(),
        cache.memsize(),
        cache.is_debug(),
    ))
}

/// Handler for PUT /debug
pub async fn debug_handler(
    State(state): State<AppState>,
    Json(req): Json<DebugRequest>,
) -> Json<DebugResponse> {
    state.cache.set_debug(req.enabled);
    Json(DebugResponse {
        debug: state.cache.is_debug(),
    })
}

/// Handler for GET /export
///
/// Returns the export text as-is so it can be fed back to POST /import.
pub async fn export_handler(State(state): State<AppState>) -> Result<Response> {
    let payload = state.cache.export()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

/// Handler for POST /import?skip_duplicates=<bool>
pub async fn import_handler(
    State(state): State<AppState>,
    Query(options): Query<ImportOptions>,
    body: String,
) -> Result<Json<ImportResponse>> {
    let size = state.cache.import(&body, options)?;
    Ok(Json(ImportResponse { size }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
