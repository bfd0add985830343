//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

/// Request body for the PUT operation (PUT /put)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value; it expires after the cache's default TTL
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: Value,
}

impl PutRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for toggling debug mode (PUT /debug)
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DebugRequest {
    pub enabled: bool,
}

/// Query string for GET /expired/:key
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ExpiredQuery {
    /// Seconds that must have passed since the expiry timestamp
    #[serde(default)]
    pub threshold: f64,
}
