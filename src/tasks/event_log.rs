//! Event Logger Task
//!
//! Background task that subscribes to the cache's event channel and logs
//! every notification.

use std::fmt;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEvent;

/// Spawns a task that logs every event received on `events`.
///
/// The task ends when the cache (and every clone of it) is dropped. Abort
/// the returned handle to stop it earlier, e.g. during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cache = MemoryCache::<String>::new(CacheConfig::default())?;
/// let logger = spawn_event_logger(cache.subscribe());
/// // Later, during shutdown:
/// logger.abort();
/// ```
pub fn spawn_event_logger<V>(mut events: broadcast::Receiver<CacheEvent<V>>) -> JoinHandle<()>
where
    V: Clone + fmt::Debug + Send + 'static,
{
    tokio::spawn(async move {
        info!("Starting cache event logger");

        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => {
                    debug!("Event channel closed, stopping event logger");
                    break;
                }
            }
        }
    })
}

fn log_event<V: fmt::Debug>(event: &CacheEvent<V>) {
    match event {
        CacheEvent::Put { key, value } => debug!(key = %key, value = ?value, "cache put"),
        CacheEvent::Expire { .. } => debug!("cache {}", event),
        _ => info!("cache {}", event),
    }
}
