// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Two-level Othello composition.
//!
//! A primary Othello sized for the common case, plus a small overflow
//! Othello that absorbs exactly the inserts that would force a primary
//! rebuild. An insert whose endpoints are already connected in the primary
//! hash graph would close a cycle there; instead of re-seeding and
//! replaying every primary key, the key is pinned to the overflow tier.
//! Lookups try the primary first and fall through.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::data_structures::olelo_othello::config::OleloOthelloConfig;
use crate::data_structures::olelo_othello::control_plane::OleloOthello;
use crate::data_structures::olelo_othello::data_plane::OthelloDataPlane;
use crate::data_structures::olelo_othello::error::{OleloOthelloError, Result};

/// Cycle-pinning wrapper over two [`OleloOthello`] maps.
#[derive(Debug, Clone)]
pub struct TwoLevelOthello<K> {
    primary: OleloOthello<K>,
    overflow: OleloOthello<K>,
}

/// Paired data-plane snapshot; queries fall through like the control plane.
#[derive(Debug, Clone)]
pub struct TwoLevelOthelloDataPlane {
    primary: OthelloDataPlane,
    overflow: OthelloDataPlane,
}

impl<K> TwoLevelOthello<K>
where
    K: Hash + Eq + Clone,
{
    /// Creates a two-level map; the primary follows `config`, the overflow
    /// uses the same cell widths at minimum capacity.
    ///
    /// Requires `digest_bits >= 1`: with no digest the primary snapshot
    /// answers every query, so overflow keys could never fall through and
    /// would read garbage primary values.
    pub fn with_config(config: OleloOthelloConfig) -> Result<Self> {
        if config.digest_bits == 0 {
            return Err(OleloOthelloError::ConfigurationError(
                "two-level composition requires digest_bits >= 1".to_string(),
            ));
        }
        let mut overflow_config = config.clone().with_initial_capacity(256);
        if let Some(seed) = config.rng_seed {
            overflow_config = overflow_config.with_rng_seed(seed.wrapping_add(1));
        }
        Ok(Self {
            primary: OleloOthello::with_config(config)?,
            overflow: OleloOthello::with_config(overflow_config)?,
        })
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.overflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.overflow.is_empty()
    }

    /// Keys currently pinned to the overflow tier.
    pub fn overflow_len(&self) -> usize {
        self.overflow.len()
    }

    /// Inserts a key. Keys whose endpoints are already connected in the
    /// primary graph go to the overflow tier; everything else lands in the
    /// primary with its usual O(tree) repair.
    pub fn insert(&mut self, key: K, value: u64) -> Result<()> {
        if self.overflow.contains(&key) {
            return Err(OleloOthelloError::DuplicateKey);
        }
        if self.primary.would_close_cycle(&key) && !self.primary.contains(&key) {
            debug!("pinning cycle-closing key to overflow tier");
            return self.overflow.insert(key, value);
        }
        self.primary.insert(key, value)
    }

    /// Removes a key from whichever tier holds it.
    pub fn remove(&mut self, key: &K) -> bool {
        self.primary.remove(key) || self.overflow.remove(key)
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.primary.get(key).or_else(|| self.overflow.get(key))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// In-place value rewrite in whichever tier holds the key.
    pub fn update_value(&mut self, key: &K, value: u64) -> Result<bool> {
        if self.primary.update_value(key, value)? {
            return Ok(true);
        }
        self.overflow.update_value(key, value)
    }

    /// Bulk value remap applied to both tiers.
    pub fn compose(&mut self, migration: &HashMap<u64, Option<u64>>) {
        self.primary.compose(migration);
        self.overflow.compose(migration);
    }

    /// Total primary plus overflow rebuilds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.primary.rebuild_count() + self.overflow.rebuild_count()
    }

    pub fn memory_cost(&self) -> usize {
        self.primary.memory_cost() + self.overflow.memory_cost()
    }

    /// Exports paired snapshots of both tiers.
    pub fn export_data_plane(&mut self) -> TwoLevelOthelloDataPlane {
        TwoLevelOthelloDataPlane {
            primary: self.primary.export_data_plane(),
            overflow: self.overflow.export_data_plane(),
        }
    }
}

impl TwoLevelOthelloDataPlane {
    /// Queries the primary tier, falling through on digest rejection.
    ///
    /// An overflow key passes the primary digest with probability
    /// `2^(1-DL)` and then reads a garbage primary value, so deployments
    /// relying on the paired snapshot size `digest_bits` for their
    /// tolerated mixup rate.
    pub fn query<K: Hash + ?Sized>(&self, key: &K) -> Option<u64> {
        self.primary
            .query(key)
            .or_else(|| self.overflow.query(key))
    }

    pub fn memory_cost(&self) -> usize {
        self.primary.memory_cost() + self.overflow.memory_cost()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> TwoLevelOthello<u64> {
        TwoLevelOthello::with_config(
            OleloOthelloConfig::new()
                .with_initial_capacity(256)
                .with_digest_bits(12)
                .with_rng_seed(0x2CE1),
        )
        .expect("construction")
    }

    #[test]
    fn test_rejects_zero_digest_bits() {
        let result = TwoLevelOthello::<u64>::with_config(
            OleloOthelloConfig::new().with_initial_capacity(256),
        );
        assert!(matches!(
            result,
            Err(OleloOthelloError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_round_trip_across_tiers() {
        let mut map = fresh();
        for k in 0u64..2000 {
            map.insert(k, k & 0xFFFF).unwrap();
        }
        assert_eq!(map.len(), 2000);
        for k in 0u64..2000 {
            assert_eq!(map.get(&k), Some(k & 0xFFFF), "key {k}");
        }
    }

    #[test]
    fn test_cycle_keys_are_pinned_not_rebuilt() {
        let mut map = fresh();
        // 500 keys against a 256-slot B array: cycles are near-certain, yet
        // the primary never resizes (its own share stays under capacity),
        // so every cycle key must land in the overflow without a rebuild.
        for k in 0u64..500 {
            map.insert(k, 1).unwrap();
        }
        assert!(map.overflow_len() > 0);
        for k in 0u64..500 {
            assert_eq!(map.get(&k), Some(1), "key {k}");
        }
    }

    #[test]
    fn test_remove_from_either_tier() {
        let mut map = fresh();
        for k in 0u64..1500 {
            map.insert(k, k).unwrap();
        }
        for k in 0u64..1500 {
            assert!(map.remove(&k), "key {k}");
        }
        assert!(map.is_empty());
    }

    #[test]
    fn test_duplicate_across_tiers_rejected() {
        let mut map = fresh();
        map.insert(9, 1).unwrap();
        assert_eq!(map.insert(9, 2), Err(OleloOthelloError::DuplicateKey));
    }

    #[test]
    fn test_paired_snapshot_query() {
        let mut map = fresh();
        for k in 0u64..1200 {
            map.insert(k, (k * 5) & 0xFFFF).unwrap();
        }
        let dp = map.export_data_plane();
        for k in 0u64..1200 {
            assert_eq!(dp.query(&k), Some((k * 5) & 0xFFFF), "key {k}");
        }
    }
}
