// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Two-level cuckoo composition.
//!
//! Level 1 is a digest-guarded [`ManuCuckoo`]: inserts refuse to co-locate
//! two keys sharing a data-plane digest, so the exported digest-only data
//! plane answers level-1 member lookups unambiguously in the overwhelming
//! majority of cases. When an incoming key collides, the whole collision
//! group (residents plus the incoming key) is relocated to the level-2
//! overflow table, where full-table digest uniqueness is not required
//! because level 2 stays tiny. Lookups try level 1 and fall through.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::data_structures::manu_cuckoo::config::ManuCuckooConfig;
use crate::data_structures::manu_cuckoo::control_plane::{DigestGuardedInsert, ManuCuckoo};
use crate::data_structures::manu_cuckoo::data_plane::CuckooDataPlane;
use crate::data_structures::manu_cuckoo::error::{ManuCuckooError, Result};

/// Digest-collision-relocating wrapper over two [`ManuCuckoo`] tables.
#[derive(Debug, Clone)]
pub struct TwoLevelCuckoo<K, V> {
    level1: ManuCuckoo<K, V>,
    level2: ManuCuckoo<K, V>,
}

/// Paired digest data planes; lookup falls through like the control plane.
#[derive(Debug, Clone)]
pub struct TwoLevelCuckooDataPlane<V> {
    level1: CuckooDataPlane<V>,
    level2: CuckooDataPlane<V>,
}

impl<K, V> TwoLevelCuckoo<K, V>
where
    K: Hash + Eq + Clone,
    V: Copy + Eq + Hash,
{
    /// Creates a two-level table; level 1 follows `config`, level 2 is
    /// sized for the expected digest-collision population.
    pub fn with_config(config: ManuCuckooConfig) -> Result<Self> {
        let mut level2_config =
            ManuCuckooConfig::new().with_initial_capacity(64.max(config.initial_capacity / 4));
        if let Some(seed) = config.rng_seed {
            level2_config = level2_config.with_rng_seed(seed.wrapping_add(1));
        }
        Ok(Self {
            level1: ManuCuckoo::with_config(config)?,
            level2: ManuCuckoo::with_config(level2_config)?,
        })
    }

    pub fn len(&self) -> usize {
        self.level1.len() + self.level2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.level1.is_empty() && self.level2.is_empty()
    }

    /// Entries currently held by the overflow level.
    pub fn overflow_len(&self) -> usize {
        self.level2.len()
    }

    /// Inserts a key. A level-1 digest collision moves the whole colliding
    /// group to level 2 along with the incoming key.
    ///
    /// # Errors
    ///
    /// * [`ManuCuckooError::DuplicateKey`] if the key is in either level.
    /// * [`ManuCuckooError::CapacityExhausted`] if either level fills; the
    ///   caller rebuilds that level larger and replays.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        if self.level1.contains(&key) || self.level2.contains(&key) {
            return Err(ManuCuckooError::DuplicateKey);
        }
        match self
            .level1
            .insert_avoiding_digest_collision(key.clone(), value)?
        {
            DigestGuardedInsert::Inserted => Ok(()),
            DigestGuardedInsert::DigestCollision { .. } => {
                let group = self.level1.take_digest_matches(&key);
                debug!(group = group.len(), "relocating digest-collision group to level 2");
                if let Err(err) = self.relocate_group(&group, &key, value) {
                    // Level 2 filled mid-relocation. Put the group back in
                    // its just-vacated level-1 slots so the failed insert
                    // leaves every previously-live key findable.
                    for (k, v) in group {
                        self.level2.remove(&k);
                        self.level1.restore(k, v);
                    }
                    return Err(err);
                }
                Ok(())
            }
        }
    }

    fn relocate_group(&mut self, group: &[(K, V)], key: &K, value: V) -> Result<()> {
        for (k, v) in group {
            self.level2.insert(k.clone(), *v)?;
        }
        self.level2.insert(key.clone(), value)
    }

    /// Removes a key from whichever level holds it.
    pub fn remove(&mut self, key: &K) -> bool {
        self.level1.remove(key) || self.level2.remove(key)
    }

    pub fn find(&self, key: &K) -> Option<V> {
        self.level1.find(key).or_else(|| self.level2.find(key))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Live entries across both levels, in unspecified order. Pairs with
    /// [`clear`] for the rebuild-larger-and-replay recovery path after a
    /// [`ManuCuckooError::CapacityExhausted`].
    ///
    /// [`clear`]: TwoLevelCuckoo::clear
    pub fn entries(&self) -> impl Iterator<Item = (&K, V)> {
        self.level1.entries().chain(self.level2.entries())
    }

    /// Drops all entries and re-primes both levels for `capacity` keys.
    pub fn clear(&mut self, capacity: u32) {
        self.level1.clear(capacity);
        self.level2.clear(64.max(capacity / 4));
    }

    /// Bulk value remap applied to both levels.
    pub fn migrate(&mut self, remap: &HashMap<V, Option<V>>) {
        self.level1.migrate(remap);
        self.level2.migrate(remap);
    }

    /// Exports paired digest data planes.
    pub fn export_data_plane(&self) -> TwoLevelCuckooDataPlane<V> {
        TwoLevelCuckooDataPlane {
            level1: self.level1.export_data_plane(),
            level2: self.level2.export_data_plane(),
        }
    }

    pub fn memory_cost(&self) -> usize {
        self.level1.memory_cost() + self.level2.memory_cost()
    }
}

impl<V: Copy> TwoLevelCuckooDataPlane<V> {
    /// Level-1 digest lookup, falling through to level 2 on a miss.
    pub fn find<K: Hash + ?Sized>(&self, key: &K) -> Option<V> {
        self.level1.find(key).or_else(|| self.level2.find(key))
    }

    pub fn memory_cost(&self) -> usize {
        self.level1.memory_cost() + self.level2.memory_cost()
    }
}
