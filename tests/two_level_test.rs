// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Integration tests for the two-level compositions: cycle pinning on the
//! Othello side, digest-collision relocation on the cuckoo side.

use std::collections::HashMap;

use makai_lookup_lib::data_structures::manu_cuckoo::ManuCuckooConfig;
use makai_lookup_lib::data_structures::olelo_othello::OleloOthelloConfig;
use makai_lookup_lib::data_structures::{TwoLevelCuckoo, TwoLevelOthello};

#[test]
fn test_two_level_othello_round_trip() {
    let mut map = TwoLevelOthello::with_config(
        OleloOthelloConfig::new()
            .with_initial_capacity(256)
            .with_digest_bits(12)
            .with_rng_seed(21),
    )
    .expect("construction");

    for k in 0u64..3000 {
        map.insert(k, k & 0xFFFF).unwrap();
    }
    for k in 0u64..3000 {
        assert_eq!(map.get(&k), Some(k & 0xFFFF), "key {k}");
    }

    let dp = map.export_data_plane();
    for k in (0u64..3000).step_by(37) {
        assert_eq!(dp.query(&k), Some(k & 0xFFFF), "key {k}");
    }

    for k in 0u64..3000 {
        assert!(map.remove(&k), "key {k}");
    }
    assert!(map.is_empty());
}

#[test]
fn test_two_level_cuckoo_collision_relocation() {
    let mut table: TwoLevelCuckoo<u64, u32> = TwoLevelCuckoo::with_config(
        ManuCuckooConfig::new()
            .with_initial_capacity(200_000)
            .with_rng_seed(5),
    )
    .expect("construction");

    // 200k keys against 16-bit digests guarantee collisions; the overflow
    // level has to hold every colliding group with nothing lost.
    for k in 0u64..200_000 {
        table.insert(k, (k % 1009) as u32).unwrap();
    }
    assert_eq!(table.len(), 200_000);
    assert!(table.overflow_len() > 0, "no collisions relocated");

    for k in (0u64..200_000).step_by(211) {
        assert_eq!(table.find(&k), Some((k % 1009) as u32), "key {k}");
    }
}

#[test]
fn test_two_level_migration_consistency() {
    let mut othello = TwoLevelOthello::with_config(
        OleloOthelloConfig::new()
            .with_initial_capacity(256)
            .with_rng_seed(8),
    )
    .expect("construction");
    let mut cuckoo: TwoLevelCuckoo<u64, u32> = TwoLevelCuckoo::with_config(
        ManuCuckooConfig::new()
            .with_initial_capacity(2048)
            .with_rng_seed(8),
    )
    .expect("construction");

    // The same connection table driven through both engines.
    for k in 0u64..1500 {
        othello.insert(k, k % 5).unwrap();
        cuckoo.insert(k, (k % 5) as u32).unwrap();
    }

    let mut othello_remap = HashMap::new();
    othello_remap.insert(4u64, None);
    othello_remap.insert(2u64, Some(6u64));
    othello.compose(&othello_remap);

    let mut cuckoo_remap = HashMap::new();
    cuckoo_remap.insert(4u32, None);
    cuckoo_remap.insert(2u32, Some(6u32));
    cuckoo.migrate(&cuckoo_remap);

    for k in 0u64..1500 {
        let othello_result = othello.get(&k);
        let cuckoo_result = cuckoo.find(&k).map(u64::from);
        assert_eq!(othello_result, cuckoo_result, "key {k}");
    }
}
