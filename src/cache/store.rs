//! Cache Store Module
//!
//! The cache engine: a HashMap of records behind one mutex, a tokio timer per
//! expiring record, lazy expiry on reads and a broadcast channel of events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::export::{self, ExpireStamp, ExportedRecord};
use crate::cache::{
    CacheEvent, CacheRecord, CacheStats, Clock, EvictionTimer, SystemClock, TtlSpec,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// Invoked with `(key, value)` after a record's eviction timer removed it.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

// == Import Options ==
/// Options for [`MemoryCache::import`].
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ImportOptions {
    /// Leave keys that already exist in the cache untouched
    #[serde(default)]
    pub skip_duplicates: bool,
}

// == Cache State ==
/// Everything guarded by the engine's mutex.
struct CacheState<V> {
    entries: HashMap<String, CacheRecord<V>>,
    /// Always equal to `entries.len()` once an operation completes
    live_count: usize,
    stats: CacheStats,
    debug: bool,
    default_ttl: Option<TtlSpec>,
    next_id: u64,
}

impl<V> CacheState<V> {
    fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            live_count: 0,
            stats: CacheStats::new(),
            debug: config.debug,
            default_ttl: config.ttl,
            next_id: 0,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Removes a record and keeps the live count paired with the map.
    /// The returned record aborts its timer when dropped.
    fn remove(&mut self, key: &str) -> Option<CacheRecord<V>> {
        let record = self.entries.remove(key)?;
        self.live_count -= 1;
        Some(record)
    }

    /// Timer-driven removal. Only removes the record the timer was armed for.
    fn evict(&mut self, key: &str, id: u64) -> Option<V> {
        if self.entries.get(key)?.id != id {
            return None;
        }
        let mut record = self.remove(key)?;
        if let Some(timer) = record.timer.take() {
            timer.disarm();
        }
        Some(record.value)
    }

    fn record_hit(&mut self) {
        if self.debug {
            self.stats.record_hit();
        }
    }

    fn record_miss(&mut self) {
        if self.debug {
            self.stats.record_miss();
        }
    }
}

// == Memory Cache ==
/// In-process key-value cache with per-entry TTL.
///
/// Cloning is cheap and yields another handle to the same cache. Expiring
/// records are removed by a timer task on the Tokio runtime the cache was
/// created on, and lazily by `get` when the timer has not run yet.
pub struct MemoryCache<V> {
    state: Arc<Mutex<CacheState<V>>>,
    events: broadcast::Sender<CacheEvent<V>>,
    clock: Arc<dyn Clock>,
    runtime: Handle,
}

impl<V> Clone for MemoryCache<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            events: self.events.clone(),
            clock: Arc::clone(&self.clock),
            runtime: self.runtime.clone(),
        }
    }
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemoryCache")
            .field("size", &state.live_count)
            .field("debug", &state.debug)
            .field("default_ttl", &state.default_ttl)
            .finish_non_exhaustive()
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + fmt::Debug + 'static,
{
    // == Constructor ==
    /// Creates a cache reading time from the system clock.
    ///
    /// Must be called from within a Tokio runtime; eviction timers are spawned
    /// on it.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache with a custom clock for expiry timestamps.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| CacheError::NoRuntime(e.to_string()))?;
        let (events, _) = broadcast::channel(config.event_capacity.max(1));

        Ok(Self {
            state: Arc::new(Mutex::new(CacheState::new(config))),
            events,
            clock,
            runtime,
        })
    }

    // == Subscribe ==
    /// Returns a receiver for every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent<V>> {
        self.events.subscribe()
    }

    fn publish(&self, event: CacheEvent<V>) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }

    // == Put ==
    /// Stores a value under `key` with the cache's default TTL and returns it.
    ///
    /// Overwriting a key replaces its record and cancels the old timer.
    pub fn put(&self, key: impl Into<String>, value: V) -> Result<V> {
        self.put_inner(key.into(), value, None)
    }

    /// Like [`put`](Self::put), calling `callback(key, value)` once the
    /// record's eviction timer removes it.
    pub fn put_with_callback<F>(&self, key: impl Into<String>, value: V, callback: F) -> Result<V>
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.put_inner(key.into(), value, Some(Arc::new(callback)))
    }

    fn put_inner(
        &self,
        key: String,
        value: V,
        callback: Option<EvictionCallback<V>>,
    ) -> Result<V> {
        let mut state = self.state.lock();
        let ttl = state.default_ttl.as_ref().map(TtlSpec::resolve).transpose()?;

        if state.debug {
            debug!(key = %key, value = ?value, ttl = ?state.default_ttl, "caching");
        }

        Ok(self.insert(&mut state, key, value, ttl, callback))
    }

    /// Installs a fresh record. Validation has already happened.
    fn insert(
        &self,
        state: &mut CacheState<V>,
        key: String,
        value: V,
        ttl: Option<Duration>,
        callback: Option<EvictionCallback<V>>,
    ) -> V {
        let now = self.clock.now_ms();
        let id = state.next_id();

        let (expire_at, timer) = match ttl {
            Some(ttl) => {
                let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
                let timer = self.schedule_eviction(key.clone(), id, ttl, callback);
                (Some(now.saturating_add(ttl_ms)), Some(timer))
            }
            None => (None, None),
        };

        let record = CacheRecord::new(value.clone(), expire_at, id, timer);
        // A replaced record is dropped here, which aborts its timer
        if state.entries.insert(key.clone(), record).is_none() {
            state.live_count += 1;
        }

        self.publish(CacheEvent::Put {
            key,
            value: value.clone(),
        });
        value
    }

    fn schedule_eviction(
        &self,
        key: String,
        id: u64,
        ttl: Duration,
        callback: Option<EvictionCallback<V>>,
    ) -> EvictionTimer {
        let state = Arc::downgrade(&self.state);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(ttl).await;

            let Some(state) = state.upgrade() else {
                return;
            };
            let evicted = {
                let mut state = state.lock();
                let evicted = state.evict(&key, id);
                if evicted.is_some() && state.debug {
                    debug!(key = %key, "evicted by timer");
                }
                evicted
            };

            if let (Some(value), Some(callback)) = (evicted, callback) {
                callback(&key, &value);
            }
        });

        EvictionTimer::new(task.abort_handle())
    }

    // == Get ==
    /// Returns the value for `key` if it is present and live.
    ///
    /// A present but stale record is removed on the spot.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();

        let lookup = state
            .entries
            .get(key)
            .map(|record| record.is_live(now).then(|| record.value.clone()));

        match lookup {
            Some(Some(value)) => {
                state.record_hit();
                Some(value)
            }
            Some(None) => {
                state.record_miss();
                state.remove(key);
                if state.debug {
                    debug!(key = %key, "expired on read");
                }
                None
            }
            None => {
                state.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Whether `key` is present and live. Never mutates the cache or stats.
    pub fn has(&self, key: &str) -> bool {
        let state = self.state.lock();
        let now = self.clock.now_ms();

        match state.entries.get(key) {
            Some(record) => {
                if state.debug {
                    debug!(key = %key, record = ?record, "has");
                }
                record.is_live(now)
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes a live key and returns true.
    ///
    /// Returns false for absent keys and for records that have already
    /// expired. An expired record only loses its timer; it stays in the map
    /// until a `get` purges it.
    pub fn del(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();
        let debug = state.debug;

        let Some(record) = state.entries.get_mut(key) else {
            return false;
        };

        if !record.is_live(now) {
            // Dropping the handle aborts the pending eviction
            drop(record.timer.take());
            if debug {
                debug!(key = %key, "del found an expired record");
            }
            return false;
        }

        state.remove(key);
        self.publish(CacheEvent::Del {
            key: key.to_string(),
        });
        true
    }

    // == Clear ==
    /// Drops every record and cancels every timer.
    ///
    /// Hit/miss counters are reset only while debug mode is on.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.live_count = 0;
        if state.debug {
            state.stats.reset();
        }
        self.publish(CacheEvent::Clear);
    }

    // == Expired ==
    /// Whether at least `threshold_secs` have passed since the key's expiry
    /// timestamp. Absent and never-expiring keys report false.
    pub fn expired(&self, key: &str, threshold_secs: f64) -> bool {
        let state = self.state.lock();
        let now = self.clock.now_ms();

        let elapsed = state
            .entries
            .get(key)
            .map(|record| record.elapsed_since_expiry_ms(now));

        self.publish(CacheEvent::Expire {
            key: key.to_string(),
            present: elapsed.is_some(),
        });

        match elapsed {
            Some(Some(elapsed_ms)) => elapsed_ms as f64 / 1000.0 >= threshold_secs,
            _ => false,
        }
    }

    // == Size ==
    /// Number of entries, from the O(1) counter.
    pub fn size(&self) -> usize {
        self.state.lock().live_count
    }

    /// Number of entries, counted by walking the map.
    #[allow(clippy::iter_count)]
    pub fn memsize(&self) -> usize {
        self.state.lock().entries.iter().count()
    }

    /// Every key in the map, stale or not, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().entries.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    // == Debug Mode ==
    pub fn set_debug(&self, enabled: bool) {
        self.state.lock().debug = enabled;
    }

    pub fn is_debug(&self) -> bool {
        self.state.lock().debug
    }

    // == Stats ==
    pub fn hits(&self) -> u64 {
        self.state.lock().stats.hits
    }

    pub fn misses(&self) -> u64 {
        self.state.lock().stats.misses
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }

    // == Default TTL ==
    pub fn default_ttl(&self) -> Option<TtlSpec> {
        self.state.lock().default_ttl.clone()
    }

    /// Changes the TTL applied by later `put` calls. `None` disables expiry.
    pub fn set_default_ttl(&self, ttl: Option<TtlSpec>) {
        self.state.lock().default_ttl = ttl;
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + fmt::Debug + Serialize + 'static,
{
    // == Export ==
    /// Serializes every record, including ones that have expired but not
    /// been purged yet.
    pub fn export(&self) -> Result<String> {
        let state = self.state.lock();

        let mut rows: Vec<(&str, ExportedRecord<&V>)> = state
            .entries
            .iter()
            .map(|(key, record)| {
                (
                    key.as_str(),
                    ExportedRecord {
                        value: &record.value,
                        expire: ExpireStamp(record.expire_at),
                    },
                )
            })
            .collect();
        rows.sort_unstable_by(|a, b| a.0.cmp(b.0));

        let payload = export::encode(&rows)?;
        self.publish(CacheEvent::Export {
            payload: payload.clone(),
        });
        Ok(payload)
    }
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + fmt::Debug + DeserializeOwned + 'static,
{
    // == Import ==
    /// Loads entries produced by [`export`](MemoryCache::export) and returns
    /// the resulting size.
    ///
    /// Entries keep their remaining lifetime. Already-expired entries are
    /// skipped and purge any existing record with the same key. Entries
    /// exported without expiry get the cache's default TTL.
    pub fn import(&self, text: &str, options: ImportOptions) -> Result<usize> {
        let rows = export::decode::<V>(text)?;
        let mut state = self.state.lock();

        // Only rows that will be inserted need the default TTL
        let needs_default = rows.iter().any(|(key, record)| {
            record.expire.0.is_none()
                && !(options.skip_duplicates && state.entries.contains_key(key))
        });
        let fallback_ttl = if needs_default {
            state.default_ttl.as_ref().map(TtlSpec::resolve).transpose()?
        } else {
            None
        };
        let now = self.clock.now_ms();

        for (key, record) in rows {
            if options.skip_duplicates && state.entries.contains_key(&key) {
                if state.debug {
                    debug!(key = %key, "skipping duplicate imported key");
                }
                continue;
            }

            let ttl = match record.expire.0 {
                Some(expire_at) => {
                    let remaining = expire_at.saturating_sub(now);
                    if remaining <= 0 {
                        state.remove(&key);
                        continue;
                    }
                    Some(Duration::from_millis(remaining as u64))
                }
                None => fallback_ttl,
            };

            self.insert(&mut state, key, record.value, ttl, None);
        }

        let size = state.live_count;
        self.publish(CacheEvent::Import { size });
        Ok(size)
    }
}
