// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Digest-only cuckoo query structure.
//!
//! Each occupied slot holds a 16-bit key digest and the value; keys are
//! not stored. A lookup matches digests across the candidate buckets, so a
//! non-member key can produce a false hit with probability about
//! `buckets_probed * slots / 2^16`; orchestrators that need exactness keep
//! digest-unique residents (see the two-level composition).

use std::hash::Hash;

use crate::data_structures::manu_cuckoo::control_plane::{CANDIDATE_BUCKETS, SLOTS_PER_BUCKET};
use crate::hashing::{multiply_high_u32, SeededHasher32};

type DigestBucket<V> = [Option<(u16, V)>; SLOTS_PER_BUCKET];

/// Immutable data-plane snapshot exported by
/// [`ManuCuckoo::export_data_plane`](super::ManuCuckoo::export_data_plane).
#[derive(Debug, Clone)]
pub struct CuckooDataPlane<V> {
    hashers: [SeededHasher32; CANDIDATE_BUCKETS],
    digest_hasher: SeededHasher32,
    num_buckets: u32,
    buckets: Vec<DigestBucket<V>>,
}

impl<V: Copy> CuckooDataPlane<V> {
    pub(crate) fn from_parts(
        hashers: [SeededHasher32; CANDIDATE_BUCKETS],
        digest_hasher: SeededHasher32,
        num_buckets: u32,
        buckets: Vec<DigestBucket<V>>,
    ) -> Self {
        Self {
            hashers,
            digest_hasher,
            num_buckets,
            buckets,
        }
    }

    /// Digest-matching lookup across the key's candidate buckets. A `Some`
    /// result is probabilistic for non-members.
    pub fn find<K: Hash + ?Sized>(&self, key: &K) -> Option<V> {
        let digest = self.digest_hasher.hash(key) as u16;
        for hasher in &self.hashers {
            let bucket = multiply_high_u32(hasher.hash(key), self.num_buckets) as usize;
            for slot in self.buckets[bucket].iter().flatten() {
                if slot.0 == digest {
                    return Some(slot.1);
                }
            }
        }
        None
    }

    /// Heap bytes held by the digest buckets.
    pub fn memory_cost(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<DigestBucket<V>>()
    }
}

#[cfg(test)]
mod tests {
    use crate::data_structures::manu_cuckoo::{ManuCuckoo, ManuCuckooConfig};

    fn build(capacity: u32) -> ManuCuckoo<u64, u32> {
        let mut table = ManuCuckoo::with_config(
            ManuCuckooConfig::new()
                .with_initial_capacity(capacity)
                .with_rng_seed(0xDACA),
        )
        .expect("construction");
        for k in 0..u64::from(capacity) {
            table.insert(k, (k * 3) as u32).expect("insert");
        }
        table
    }

    #[test]
    fn test_snapshot_finds_all_members() {
        let table = build(2000);
        let dp = table.export_data_plane();
        for (key, value) in table.entries() {
            assert_eq!(dp.find(key), Some(value), "key {key}");
        }
    }

    #[test]
    fn test_snapshot_is_decoupled_from_later_writes() {
        let mut table = build(100);
        let dp = table.export_data_plane();
        table.remove(&0);
        assert_eq!(dp.find(&0), Some(0));
    }

    #[test]
    fn test_non_member_hits_are_rare() {
        let table = build(2000);
        let dp = table.export_data_plane();
        let probes = 10_000u64;
        let mut hits = 0u32;
        for k in 0..probes {
            if dp.find(&(1_000_000 + k)).is_some() {
                hits += 1;
            }
        }
        // ~20 probed slots against a 16-bit digest: expect well under 1%.
        assert!(hits < probes as u32 / 100, "unexpected hit rate: {hits}/{probes}");
    }
}
