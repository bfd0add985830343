//! Cache Entry Module
//!
//! Defines the record stored per key: value, absolute expiry and the handle of
//! its pending eviction timer.

use tokio::task::AbortHandle;

// == Eviction Timer ==
/// Owned handle to a scheduled eviction task.
///
/// Dropping the handle aborts the task, so replacing or removing a record
/// cancels its timer without any extra bookkeeping.
#[derive(Debug)]
pub struct EvictionTimer {
    handle: Option<AbortHandle>,
}

impl EvictionTimer {
    pub fn new(handle: AbortHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Releases the handle without aborting. Used by the task that is firing.
    pub fn disarm(mut self) {
        self.handle.take();
    }
}

impl Drop for EvictionTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

// == Cache Record ==
/// A single cache entry with value and expiry metadata.
#[derive(Debug)]
pub struct CacheRecord<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expire_at: Option<i64>,
    /// Identity of this record, unique within one cache
    pub(crate) id: u64,
    /// Pending eviction, None for records that never expire
    pub(crate) timer: Option<EvictionTimer>,
}

impl<V> CacheRecord<V> {
    // == Constructor ==
    pub fn new(value: V, expire_at: Option<i64>, id: u64, timer: Option<EvictionTimer>) -> Self {
        Self {
            value,
            expire_at,
            id,
            timer,
        }
    }

    // == Is Live ==
    /// Checks if the entry is still live at `now_ms`.
    ///
    /// An entry stays live up to and including its expiry millisecond; it
    /// becomes stale once `now_ms` is strictly past `expire_at`.
    pub fn is_live(&self, now_ms: i64) -> bool {
        match self.expire_at {
            Some(expire_at) => expire_at >= now_ms,
            None => true,
        }
    }

    // == Elapsed Since Expiry ==
    /// Milliseconds elapsed since the expiry timestamp; negative while the
    /// entry is live, None when it never expires.
    pub fn elapsed_since_expiry_ms(&self, now_ms: i64) -> Option<i64> {
        self.expire_at.map(|expire_at| now_ms.saturating_sub(expire_at))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_record_no_expiration_is_always_live() {
        let record = CacheRecord::new("value", None, 1, None);

        assert!(record.is_live(0));
        assert!(record.is_live(i64::MAX));
        assert!(record.elapsed_since_expiry_ms(10).is_none());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let record = CacheRecord::new("value", Some(1_000), 1, None);

        // Live up to and including the expiry millisecond
        assert!(record.is_live(999));
        assert!(record.is_live(1_000));
        assert!(!record.is_live(1_001));
    }

    #[test]
    fn test_elapsed_since_expiry() {
        let record = CacheRecord::new("value", Some(1_000), 1, None);

        assert_eq!(record.elapsed_since_expiry_ms(400), Some(-600));
        assert_eq!(record.elapsed_since_expiry_ms(3_000), Some(2_000));
    }

    #[tokio::test]
    async fn test_dropping_timer_aborts_task() {
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let timer = EvictionTimer::new(task.abort_handle());

        drop(timer);

        let result = task.await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_disarmed_timer_lets_task_finish() {
        let task = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7
        });
        let timer = EvictionTimer::new(task.abort_handle());

        timer.disarm();

        assert_eq!(task.await.unwrap(), 7);
    }
}
