// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Integration tests for the Manu Cuckoo engine: load-factor fill,
//! eviction behavior under pressure, migration and data-plane export,
//! driven through the public crate surface.

use std::collections::HashMap;

use proptest::prelude::*;

use makai_lookup_lib::data_structures::manu_cuckoo::{
    ManuCuckoo, ManuCuckooConfig, ManuCuckooError,
};

#[test]
fn test_fills_to_nominal_capacity() {
    // The table is sized at an 0.85 load factor, so filling to nominal
    // capacity must succeed without a capacity error.
    let capacity = 50_000u32;
    let mut table: ManuCuckoo<u64, u32> = ManuCuckoo::new(capacity).expect("construction");
    for k in 0..u64::from(capacity) {
        table
            .insert(k, (k % 65_536) as u32)
            .expect("insert within nominal capacity");
    }
    assert_eq!(table.len(), capacity as usize);
}

#[test]
fn test_forced_eviction_scenario() {
    // A small table forces BFS evictions well before it is full; every
    // previously inserted key must survive each eviction chain, and a
    // final failed insert must leave the table untouched.
    let mut table: ManuCuckoo<u64, u32> = ManuCuckoo::with_config(
        ManuCuckooConfig::new()
            .with_initial_capacity(32)
            .with_rng_seed(3),
    )
    .expect("construction");

    let mut stored = Vec::new();
    for k in 0u64..100_000 {
        match table.insert(k, k as u32) {
            Ok(()) => stored.push(k),
            Err(ManuCuckooError::CapacityExhausted) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert!(stored.len() >= 32, "table filled too early: {}", stored.len());

    assert_eq!(table.len(), stored.len());
    for k in &stored {
        assert_eq!(table.find(k), Some(*k as u32), "key {k}");
    }
}

#[test]
fn test_migrate_deletion_marker_scenario() {
    let mut table: ManuCuckoo<u64, u32> = ManuCuckoo::new(4096).expect("construction");
    for k in 0u64..4000 {
        table.insert(k, (k % 4) as u32).unwrap();
    }

    let mut remap = HashMap::new();
    remap.insert(3u32, None);
    remap.insert(1u32, Some(9u32));
    table.migrate(&remap);

    let mut expected_len = 0usize;
    for k in 0u64..4000 {
        let expected = match k % 4 {
            3 => None,
            1 => Some(9),
            v => Some(v as u32),
        };
        assert_eq!(table.find(&k), expected, "key {k}");
        if expected.is_some() {
            expected_len += 1;
        }
    }
    assert_eq!(table.len(), expected_len);
}

#[test]
fn test_data_plane_export_round_trip() {
    let mut table: ManuCuckoo<String, u32> = ManuCuckoo::new(1000).expect("construction");
    for k in 0u32..1000 {
        table.insert(format!("conn-{k}"), k % 16).unwrap();
    }
    let dp = table.export_data_plane();
    for (key, value) in table.entries() {
        assert_eq!(dp.find(key.as_str()), Some(value), "key {key}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A mixed insert/remove workload agrees with a reference HashMap.
    #[test]
    fn prop_matches_reference_map(ops in prop::collection::vec((any::<bool>(), 0u64..300, any::<u32>()), 1..400)) {
        let mut table: ManuCuckoo<u64, u32> = ManuCuckoo::with_config(
            ManuCuckooConfig::new()
                .with_initial_capacity(512)
                .with_rng_seed(0xBEEF),
        )
        .expect("construction");
        let mut reference: HashMap<u64, u32> = HashMap::new();

        for (is_insert, key, value) in ops {
            if is_insert {
                let inserted = table.insert(key, value).is_ok();
                prop_assert_eq!(inserted, !reference.contains_key(&key));
                if inserted {
                    reference.insert(key, value);
                }
            } else {
                let removed = table.remove(&key);
                prop_assert_eq!(removed, reference.remove(&key).is_some());
            }
        }

        prop_assert_eq!(table.len(), reference.len());
        for (key, value) in &reference {
            prop_assert_eq!(table.find(key), Some(*value));
        }
    }
}
