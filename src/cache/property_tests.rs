//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check round-trip, bound, and FIFO eviction behavior.

use proptest::prelude::*;
use std::collections::{HashSet, VecDeque};

use crate::cache::{ResponseCache, DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS};

// == Strategies ==
/// Generates cache keys shaped like the logical query keys
fn key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("latest".to_string()),
        Just("trending".to_string()),
        "[a-z]{2,12}".prop_map(|q| format!("search_{q}_20_0")),
        "[0-9]{1,10}".prop_map(|id| format!("detail_{id}")),
    ]
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,128}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing and immediately reading a key within TTL returns the value unchanged.
    #[test]
    fn prop_roundtrip_within_ttl(
        key in key_strategy(),
        value in value_strategy(),
        stored_at in 0u64..1_000_000_000,
        elapsed in 0u64..(DEFAULT_TTL_SECS * 1000),
    ) {
        let mut cache = ResponseCache::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS);

        cache.set_at(key.clone(), value.clone(), stored_at);

        prop_assert_eq!(cache.get_at(&key, stored_at + elapsed), Some(value));
    }

    // Reads at or after TTL are misses.
    #[test]
    fn prop_stale_after_ttl(
        key in key_strategy(),
        value in value_strategy(),
        extra in 0u64..1_000_000,
    ) {
        let mut cache = ResponseCache::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS);

        cache.set_at(key.clone(), value, 0);

        prop_assert_eq!(cache.get_at(&key, DEFAULT_TTL_SECS * 1000 + extra), None);
    }

    // Size never exceeds the bound, whatever the insert sequence.
    #[test]
    fn prop_capacity_enforcement(
        keys in prop::collection::vec("[a-z]{1,4}", 1..300)
    ) {
        let max_entries = 50;
        let mut cache = ResponseCache::new(max_entries, DEFAULT_TTL_SECS);

        for key in keys {
            cache.set(key, ());
            prop_assert!(cache.len() <= max_entries);
        }
    }

    // The cache agrees with a reference FIFO model: overwrites keep position,
    // overflow evicts the oldest inserted key.
    #[test]
    fn prop_matches_fifo_model(
        keys in prop::collection::vec("[a-z]{1,3}", 1..200)
    ) {
        let max_entries = 20;
        let mut cache = ResponseCache::new(max_entries, DEFAULT_TTL_SECS);
        let mut model: VecDeque<String> = VecDeque::new();

        for key in keys {
            cache.set(key.clone(), ());
            if !model.contains(&key) {
                model.push_back(key);
                if model.len() > max_entries {
                    model.pop_front();
                }
            }
        }

        let expected: HashSet<&String> = model.iter().collect();
        prop_assert_eq!(cache.len(), expected.len());
        for key in &model {
            prop_assert!(cache.contains_key(key), "missing {}", key);
        }
    }
}

#[test]
fn test_inserting_past_bound_evicts_first_inserted_still_present() {
    let mut cache = ResponseCache::new(DEFAULT_MAX_ENTRIES, DEFAULT_TTL_SECS);

    for i in 0..DEFAULT_MAX_ENTRIES {
        cache.set(format!("k{i}"), i);
    }
    cache.set("k101".to_string(), 101);
    cache.set("k102".to_string(), 102);

    assert_eq!(cache.len(), DEFAULT_MAX_ENTRIES);
    assert!(!cache.contains_key("k0"));
    assert!(!cache.contains_key("k1"));
    assert!(cache.contains_key("k2"));
}
