//! Cache Module
//!
//! Provides the in-memory cache engine with per-entry TTL expiration,
//! hit/miss accounting and change events.

mod clock;
mod entry;
mod event;
mod export;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheRecord, EvictionTimer};
pub use event::CacheEvent;
pub use export::{ExpireStamp, ExportedRecord, NEVER_EXPIRES};
pub use stats::CacheStats;
pub use store::{EvictionCallback, ImportOptions, MemoryCache};
pub use ttl::{format, TtlSpec, DEFAULT_TTL_TEXT};
