//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify cache key determinism and result cache
//! storage, expiry and eviction behavior.

use proptest::prelude::*;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use crate::cache::key::write_object;
use crate::cache::{canonical_json, CacheKey, ManualClock, ResultCache};

// == Test Configuration ==
const TEST_MAX_SIZE: u64 = 64 * 1024;
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

fn open_cache(dir: &TempDir, max_size: u64) -> (ResultCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let cache =
        ResultCache::open_with_clock(dir.path(), max_size, TEST_DEFAULT_TTL, clock.clone()).unwrap();
    (cache, clock)
}

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates document-like payloads
fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..512)
}

/// Generates flat JSON field lists with unique names
fn fields_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::btree_map("[a-z]{1,8}", any::<i64>(), 1..12)
        .prop_map(|map| map.into_iter().collect())
}

/// The same field list twice, the second copy in arbitrary order
fn shuffled_fields_strategy() -> impl Strategy<Value = (Vec<(String, i64)>, Vec<(String, i64)>)> {
    fields_strategy().prop_flat_map(|fields| (Just(fields.clone()), Just(fields).prop_shuffle()))
}

fn object_from(fields: impl Iterator<Item = (String, i64)>) -> Value {
    let mut map = Map::new();
    for (name, value) in fields {
        map.insert(name, Value::from(value));
    }
    Value::Object(map)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, content: Vec<u8> },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let key = "[a-d]{1,2}";
    prop_oneof![
        (key, content_strategy()).prop_map(|(key, content)| CacheOp::Set { key, content }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Canonical output depends on object contents, never on entry order.
    #[test]
    fn prop_canonical_object_independent_of_entry_order((fields, shuffled) in shuffled_fields_strategy()) {
        let values: Vec<(String, Value)> = fields.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect();
        let shuffled_values: Vec<(String, Value)> =
            shuffled.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect();

        let mut ordered = String::new();
        write_object(values.iter().map(|(k, v)| (k, v)).collect(), &mut ordered);
        let mut arbitrary = String::new();
        write_object(shuffled_values.iter().map(|(k, v)| (k, v)).collect(), &mut arbitrary);

        prop_assert_eq!(&ordered, &arbitrary);
        prop_assert_eq!(ordered, canonical_json(&object_from(fields.into_iter())));
    }

    // Equal objects built in different orders hash to the same key.
    #[test]
    fn prop_key_independent_of_field_order(fields in fields_strategy(), kind in "[a-z_]{1,16}") {
        let forward = object_from(fields.clone().into_iter());
        let reversed = object_from(fields.into_iter().rev());
        let config = Value::Object(Map::new());

        prop_assert_eq!(
            CacheKey::compute(&kind, &forward, &config),
            CacheKey::compute(&kind, &reversed, &config)
        );
    }

    // Changing any single field value changes the key.
    #[test]
    fn prop_key_sensitive_to_values(fields in fields_strategy(), pick in any::<prop::sample::Index>()) {
        let original = object_from(fields.clone().into_iter());
        let i = pick.index(fields.len());
        let mut changed_fields = fields;
        changed_fields[i].1 = changed_fields[i].1.wrapping_add(1);
        let changed = object_from(changed_fields.into_iter());
        let config = Value::Object(Map::new());

        prop_assert_ne!(
            CacheKey::compute("session", &original, &config),
            CacheKey::compute("session", &changed, &config)
        );
    }

    // Storing and immediately reading returns the exact bytes.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), content in content_strategy()) {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open_cache(&dir, TEST_MAX_SIZE);

        cache.set(&key, &content, None);
        prop_assert_eq!(cache.get(&key), Some(content));
    }

    // Hit and miss counters mirror what callers observed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..40)) {
        let dir = TempDir::new().unwrap();
        let (mut cache, _) = open_cache(&dir, TEST_MAX_SIZE);
        let mut expected_hits = 0u64;
        let mut expected_misses = 0u64;

        for op in ops {
            match op {
                CacheOp::Set { key, content } => cache.set(&key, &content, None),
                CacheOp::Get { key } => match cache.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    cache.delete(&key);
                }
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, cache.len());
    }

    // The first read after expiry misses and drops the entry from the index.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        content in content_strategy(),
        ttl_ms in 1u64..10_000
    ) {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open_cache(&dir, TEST_MAX_SIZE);

        cache.set(&key, &content, Some(Duration::from_millis(ttl_ms)));
        clock.advance(Duration::from_millis(ttl_ms));
        prop_assert!(cache.get(&key).is_some(), "entry should be live at expires_at");

        clock.advance(Duration::from_millis(1));
        prop_assert!(cache.get(&key).is_none());
        prop_assert!(!cache.contains_key(&key));
    }

    // Inserting an entry that needs k slots evicts exactly the k least
    // recently accessed entries, oldest first.
    #[test]
    fn prop_lru_eviction_order(
        count in 2usize..10,
        slots_needed in 1usize..10,
        slot_size in 1u64..64,
        touched in any::<prop::sample::Index>()
    ) {
        prop_assume!(slots_needed <= count);

        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = open_cache(&dir, slot_size * count as u64);

        let mut keys: Vec<String> = (0..count).map(|i| format!("entry{i}")).collect();
        for key in &keys {
            cache.set(key, &vec![0u8; slot_size as usize], None);
            clock.advance(Duration::from_millis(5));
        }

        // Reading one entry moves it to the back of the eviction order
        let touched_key = keys.remove(touched.index(count));
        prop_assert!(cache.get(&touched_key).is_some());
        clock.advance(Duration::from_millis(5));
        keys.push(touched_key);

        cache.set("incoming", &vec![1u8; slot_size as usize * slots_needed], None);

        prop_assert_eq!(cache.stats().evictions, slots_needed as u64);
        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(cache.contains_key(key), i >= slots_needed, "key {}", key);
        }
        prop_assert!(cache.contains_key("incoming"));
    }
}
