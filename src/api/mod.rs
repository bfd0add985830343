//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /put` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `GET /has/:key` - Check whether a key is live
//! - `DELETE /del/:key` - Delete a key
//! - `POST /clear` - Clear the cache
//! - `GET /expired/:key` - Query expiry age
//! - `GET /stats` - Get cache statistics
//! - `PUT /debug` - Toggle debug mode
//! - `GET /export`, `POST /import` - Serialize and restore the cache
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
