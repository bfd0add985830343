//! ttl_memcache - An in-process key-value cache
//!
//! Provides per-entry TTL expiration (eager timers plus lazy checks on read),
//! hit/miss accounting, change events and JSON export/import, with an
//! optional HTTP surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEvent, ImportOptions, MemoryCache, TtlSpec};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_event_logger;
