//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, debug_handler, delete_handler, expired_handler, export_handler, get_handler,
    has_handler, health_handler, import_handler, put_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /put` - Store a key-value pair
/// - `GET /get/:key` - Retrieve a live value
/// - `GET /has/:key` - Check whether a key is live
/// - `DELETE /del/:key` - Delete a live key
/// - `POST /clear` - Drop every entry
/// - `GET /expired/:key` - Time elapsed since a key's expiry
/// - `GET /stats` - Hit/miss counters and sizes
/// - `PUT /debug` - Toggle debug mode
/// - `GET /export` - Serialize the cache
/// - `POST /import` - Load a serialized cache
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/put", put(put_handler))
        .route("/get/:key", get(get_handler))
        .route("/has/:key", get(has_handler))
        .route("/del/:key", delete(delete_handler))
        .route("/clear", post(clear_handler))
        .route("/expired/:key", get(expired_handler))
        .route("/stats", get(stats_handler))
        .route("/debug", put(debug_handler))
        .route("/export", get(export_handler))
        .route("/import", post(import_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
