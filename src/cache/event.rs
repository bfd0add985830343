//! Cache Events
//!
//! Typed notifications published by the engine. Subscribers receive their own
//! copy through a broadcast channel and cannot affect the operation that
//! produced it.

use std::fmt;

/// A change notification emitted by the cache engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent<V> {
    /// A value was stored (fresh insert or overwrite)
    Put { key: String, value: V },
    /// A live key was explicitly deleted
    Del { key: String },
    /// The whole cache was cleared
    Clear,
    /// An expiry query ran; `present` tells whether the key was in the map
    Expire { key: String, present: bool },
    /// The cache was serialized
    Export { payload: String },
    /// An import finished with `size` live entries
    Import { size: usize },
}

impl<V> CacheEvent<V> {
    /// Short event name: `put`, `del`, `clear`, `expire`, `export` or `import`.
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::Put { .. } => "put",
            CacheEvent::Del { .. } => "del",
            CacheEvent::Clear => "clear",
            CacheEvent::Expire { .. } => "expire",
            CacheEvent::Export { .. } => "export",
            CacheEvent::Import { .. } => "import",
        }
    }

    /// The key this event concerns, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            CacheEvent::Put { key, .. }
            | CacheEvent::Del { key }
            | CacheEvent::Expire { key, .. } => Some(key),
            CacheEvent::Clear | CacheEvent::Export { .. } | CacheEvent::Import { .. } => None,
        }
    }
}

impl<V> fmt::Display for CacheEvent<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheEvent::Expire { key, present } => write!(f, "expire {} (present={})", key, present),
            CacheEvent::Export { payload } => write!(f, "export ({} bytes)", payload.len()),
            CacheEvent::Import { size } => write!(f, "import (size={})", size),
            other => match other.key() {
                Some(key) => write!(f, "{} {}", other.name(), key),
                None => f.write_str(other.name()),
            },
        }
    }
}
