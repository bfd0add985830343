//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from
//! environment variables.

use std::env;

use serde::Deserialize;

use crate::cache::{TtlSpec, DEFAULT_TTL_TEXT};

/// Default capacity of the event broadcast channel
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

// == Cache Config ==
/// Options recognized by the cache engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default TTL: a number of milliseconds or a duration string; None = never expire
    pub ttl: Option<TtlSpec>,
    /// Start with debug mode (stats + diagnostic logging) enabled
    pub debug: bool,
    /// Events buffered per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl CacheConfig {
    /// Default configuration with the given TTL.
    pub fn with_ttl(ttl: Option<TtlSpec>) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Some(TtlSpec::Text(DEFAULT_TTL_TEXT.to_string())),
            debug: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL for cached entries
    pub ttl: Option<TtlSpec>,
    /// Whether debug mode starts enabled
    pub debug: bool,
    /// Event channel capacity
    pub event_capacity: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL` - Integer milliseconds, a duration string, or `none` (default: 10sec)
    /// - `CACHE_DEBUG` - Enable debug mode (default: false)
    /// - `EVENT_CAPACITY` - Event channel capacity (default: 1024)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env::var("CACHE_TTL")
                .ok()
                .map_or(defaults.ttl, |v| parse_ttl(&v)),
            debug: env::var("CACHE_DEBUG")
                .ok()
                .map_or(defaults.debug, |v| parse_flag(&v)),
            event_capacity: env::var("EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_capacity),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// The engine-facing part of the configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: self.ttl.clone(),
            debug: self.debug,
            event_capacity: self.event_capacity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            ttl: cache.ttl,
            debug: cache.debug,
            event_capacity: cache.event_capacity,
            server_port: 3000,
        }
    }
}

/// `none`, `never` and `off` disable expiry; anything else is a [`TtlSpec`].
fn parse_ttl(value: &str) -> Option<TtlSpec> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "never" | "off" => None,
        _ => Some(value.parse().unwrap_or_else(|never| match never {})),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
