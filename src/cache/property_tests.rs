//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the engine against a plain HashMap model, driven by
//! a manual clock so expiry is deterministic.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{format, Clock, ImportOptions, ManualClock, MemoryCache, TtlSpec};
use crate::config::CacheConfig;

// == Test Configuration ==
const START_MS: i64 = 1_700_000_000_000;
const TEST_TTL_MS: i64 = 1_000;

/// Runtime the engine spawns its timers on. It is never driven, so timers
/// stay parked and only lazy expiry is observed.
fn test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn test_cache(ttl: Option<TtlSpec>) -> (MemoryCache<String>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MS));
    let cache = MemoryCache::with_clock(CacheConfig::with_ttl(ttl), clock.clone()).unwrap();
    (cache, clock)
}

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,32}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
    Advance { ms: u64 },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Put { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Has { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        2 => (0u64..1_500).prop_map(|ms| CacheOp::Advance { ms }),
        1 => Just(CacheOp::Clear),
    ]
}

// == Reference Model ==
/// key -> (value, expire_at)
#[derive(Default)]
struct Model {
    entries: HashMap<String, (String, i64)>,
    hits: u64,
    misses: u64,
}

impl Model {
    fn is_live(&self, key: &str, now: i64) -> Option<bool> {
        self.entries.get(key).map(|(_, expire_at)| *expire_at >= now)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The engine agrees with the model on every read, and the O(1) counter
    // always equals the real map size.
    #[test]
    fn prop_engine_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let rt = test_runtime();
        let _guard = rt.enter();
        let (cache, clock) = test_cache(Some(TtlSpec::Millis(TEST_TTL_MS)));
        cache.set_debug(true);
        let mut model = Model::default();

        for op in ops {
            let now = clock.now_ms();
            match op {
                CacheOp::Put { key, value } => {
                    cache.put(key.clone(), value.clone()).unwrap();
                    model.entries.insert(key, (value, now + TEST_TTL_MS));
                }
                CacheOp::Get { key } => {
                    let expected = match model.is_live(&key, now) {
                        Some(true) => {
                            model.hits += 1;
                            model.entries.get(&key).map(|(value, _)| value.clone())
                        }
                        Some(false) => {
                            model.misses += 1;
                            model.entries.remove(&key);
                            None
                        }
                        None => {
                            model.misses += 1;
                            None
                        }
                    };
                    prop_assert_eq!(cache.get(&key), expected);
                }
                CacheOp::Has { key } => {
                    let expected = model.is_live(&key, now).unwrap_or(false);
                    prop_assert_eq!(cache.has(&key), expected);
                }
                CacheOp::Delete { key } => {
                    // Stale records survive a failed delete
                    let expected = model.is_live(&key, now).unwrap_or(false);
                    if expected {
                        model.entries.remove(&key);
                    }
                    prop_assert_eq!(cache.del(&key), expected);
                }
                CacheOp::Advance { ms } => {
                    clock.advance(Duration::from_millis(ms));
                }
                CacheOp::Clear => {
                    cache.clear();
                    model.entries.clear();
                    model.hits = 0;
                    model.misses = 0;
                }
            }

            prop_assert_eq!(cache.size(), cache.memsize(), "live count diverged");
            prop_assert_eq!(cache.size(), model.entries.len());
        }

        prop_assert_eq!(cache.hits(), model.hits, "Hits mismatch");
        prop_assert_eq!(cache.misses(), model.misses, "Misses mismatch");
    }

    // *For any* key, storing V1 then V2 leaves exactly one entry holding V2.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy()
    ) {
        let rt = test_runtime();
        let _guard = rt.enter();
        let (cache, _) = test_cache(Some("10sec".into()));

        cache.put(key.clone(), value1).unwrap();
        cache.put(key.clone(), value2.clone()).unwrap();

        prop_assert_eq!(cache.get(&key), Some(value2));
        prop_assert_eq!(cache.size(), 1);
        prop_assert_eq!(cache.memsize(), 1);
    }

    // Entries without expiry survive any amount of elapsed time.
    #[test]
    fn prop_never_expiring_survives(
        key in key_strategy(),
        value in value_strategy(),
        elapsed_secs in 0u64..10_000_000
    ) {
        let rt = test_runtime();
        let _guard = rt.enter();
        let (cache, clock) = test_cache(None);

        cache.put(key.clone(), value.clone()).unwrap();
        clock.advance(Duration::from_secs(elapsed_secs));

        prop_assert!(cache.has(&key));
        prop_assert_eq!(cache.get(&key), Some(value));
    }

    // export() then import() on a fresh cache reproduces size and live pairs.
    #[test]
    fn prop_export_import_roundtrip(
        entries in prop::collection::hash_map(key_strategy(), value_strategy(), 0..5),
        expired_key in prop::option::of(key_strategy())
    ) {
        let rt = test_runtime();
        let _guard = rt.enter();
        let (source, clock) = test_cache(Some("1min".into()));
        for (key, value) in &entries {
            source.put(key.clone(), value.clone()).unwrap();
        }
        // One already-stale record that must not come back
        if let Some(key) = expired_key.filter(|key| !entries.contains_key(key)) {
            source.set_default_ttl(Some(TtlSpec::Millis(1)));
            source.put(key, "stale".to_string()).unwrap();
            clock.advance(Duration::from_millis(5));
        }

        let text = source.export().unwrap();
        let target: MemoryCache<String> =
            MemoryCache::with_clock(CacheConfig::with_ttl(Some("1min".into())), clock.clone())
                .unwrap();
        let size = target.import(&text, ImportOptions::default()).unwrap();

        prop_assert_eq!(size, entries.len());
        prop_assert_eq!(target.size(), target.memsize());
        for (key, value) in &entries {
            prop_assert_eq!(target.get(key), Some(value.clone()));
        }
    }

    // Numeric part scales by the unit's factor in seconds.
    #[test]
    fn prop_format_scaling(n in 0u32..100_000) {
        let n = f64::from(n);
        prop_assert_eq!(format(&format!("{}sec", n)), n);
        prop_assert_eq!(format(&format!("{}min", n)), n * 60.0);
        prop_assert_eq!(format(&format!("{}hr", n)), n * 3600.0);
    }
}

// Separate proptest block with fewer cases for real-time timer tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(3))]

    // *For any* entry stored with a short TTL, the eviction timer removes it
    // without any read touching the key.
    #[test]
    fn prop_timer_eviction(key in key_strategy(), value in value_strategy()) {
        let rt = test_runtime();
        let evicted = rt.block_on(async {
            let cache: MemoryCache<String> =
                MemoryCache::new(CacheConfig::with_ttl(Some(TtlSpec::Millis(20)))).unwrap();
            cache.put(key, value).unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
            cache.memsize() == 0 && cache.size() == 0
        });
        prop_assert!(evicted, "Entry should be evicted by its timer");
    }
}
