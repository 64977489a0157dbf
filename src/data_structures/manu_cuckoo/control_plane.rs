// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Control-plane cuckoo hash table.
//!
//! A presized 4-way-candidate, 5-slot-per-bucket cuckoo table. Inserts that
//! find no free slot in any candidate bucket run a breadth-first search for
//! a bounded eviction path (search before moving, so at most one path's
//! worth of slots is dirtied); a failed search leaves the table untouched
//! and reports [`ManuCuckooError::CapacityExhausted`].
//!
//! The data plane stores a 16-bit digest instead of the key, so a variant
//! insert ([`ManuCuckoo::insert_avoiding_digest_collision`]) refuses to
//! co-locate two keys whose digests collide and hands the resident key back
//! for relocation.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::data_structures::manu_cuckoo::config::ManuCuckooConfig;
use crate::data_structures::manu_cuckoo::data_plane::CuckooDataPlane;
use crate::data_structures::manu_cuckoo::error::{ManuCuckooError, Result};
use crate::hashing::{multiply_high_u32, SeededHasher32};

/// Candidate buckets probed per key.
pub const CANDIDATE_BUCKETS: usize = 4;

/// Slots per bucket.
pub const SLOTS_PER_BUCKET: usize = 5;

/// Fraction of nominal capacity the table is sized to hold. Conservative
/// so insertion failure stays rare and no rebuild path is needed.
pub const LOAD_FACTOR: f64 = 0.85;

/// Maximum eviction-path length (including the root). Longer paths mean
/// visiting far more candidates for very little extra occupancy.
pub const MAX_BFS_PATH_LEN: u8 = 5;

// BFS frontier bounds: the queue holds up to
// CANDIDATE_BUCKETS * sum_{k<MAX_BFS_PATH_LEN} ((CANDIDATE_BUCKETS-1) * SLOTS_PER_BUCKET)^k
// entries; the visited list never holds the deepest level.
const fn frontier_size(levels: u8) -> usize {
    let mut result = 0;
    let mut term = CANDIDATE_BUCKETS;
    let mut i = 0;
    while i < levels {
        result += term;
        term *= (CANDIDATE_BUCKETS - 1) * SLOTS_PER_BUCKET;
        i += 1;
    }
    result
}
const MAX_QUEUE_SIZE: usize = frontier_size(MAX_BFS_PATH_LEN);
const VISITED_LIST_SIZE: usize = frontier_size(MAX_BFS_PATH_LEN - 1);

/// One occupied slot: full key plus value.
#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
}

#[derive(Debug, Clone)]
struct Bucket<K, V> {
    slots: [Option<Slot<K, V>>; SLOTS_PER_BUCKET],
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

/// One step of a candidate eviction path.
#[derive(Debug, Clone, Copy)]
struct PathEntry {
    bucket: u32,
    depth: u8,
    /// Index into the visited list; `usize::MAX` for roots.
    parent: usize,
    /// Which slot of the parent bucket this step would evict.
    parent_slot: usize,
}

/// Outcome of a digest-guarded insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestGuardedInsert<K> {
    /// The key was placed; no resident key shares its digest.
    Inserted,
    /// A resident key in a candidate bucket shares the data-plane digest.
    /// Nothing was inserted; the caller relocates the residents and the
    /// incoming key together.
    DigestCollision { resident: K },
}

/// The mutable cuckoo map: full keys and values per slot.
///
/// # Type Parameters
///
/// * `K` - Key type, `Hash + Eq + Clone`.
/// * `V` - Value type, `Copy + Eq + Hash` (hashed in migration tables).
#[derive(Debug, Clone)]
pub struct ManuCuckoo<K, V> {
    config: ManuCuckooConfig,
    hashers: [SeededHasher32; CANDIDATE_BUCKETS],
    digest_hasher: SeededHasher32,
    num_buckets: u32,
    buckets: Vec<Bucket<K, V>>,
    entry_count: usize,
    /// BFS scratch, reused across inserts.
    queue: VecDeque<PathEntry>,
    visited: Vec<PathEntry>,
}

impl<K, V> ManuCuckoo<K, V>
where
    K: Hash + Eq + Clone,
    V: Copy + Eq + Hash,
{
    /// Creates a table sized for `capacity` entries.
    pub fn new(capacity: u32) -> Result<Self> {
        Self::with_config(ManuCuckooConfig::new().with_initial_capacity(capacity))
    }

    /// Creates a table with the given configuration.
    pub fn with_config(config: ManuCuckooConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let capacity = config.initial_capacity;
        let mut table = Self {
            config,
            hashers: std::array::from_fn(|_| SeededHasher32::new(rng.gen())),
            digest_hasher: SeededHasher32::new(rng.gen()),
            num_buckets: 0,
            buckets: Vec::new(),
            entry_count: 0,
            queue: VecDeque::with_capacity(MAX_QUEUE_SIZE.min(4096)),
            visited: Vec::with_capacity(VISITED_LIST_SIZE.min(4096)),
        };
        table.clear(capacity);
        Ok(table)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entry_count
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Discards all entries and re-primes the table for `capacity` entries.
    pub fn clear(&mut self, capacity: u32) {
        self.entry_count = 0;
        let entries = (f64::from(capacity) / LOAD_FACTOR) as u32;
        let mut num_buckets = entries.div_ceil(SLOTS_PER_BUCKET as u32);
        // Tiny tables see too many same-bucket hashes; pad the floor.
        num_buckets += 32;
        self.num_buckets = num_buckets;
        self.buckets.clear();
        self.buckets
            .resize_with(num_buckets as usize, Bucket::default);
    }

    /// Data-plane digest of a key.
    pub fn digest(&self, key: &K) -> u16 {
        self.digest_hasher.hash(key) as u16
    }

    /// Inserts a key-value pair.
    ///
    /// All candidate buckets are scanned for a duplicate before the first
    /// free slot is used, so the duplicate check is authoritative. With no
    /// free slot, a bounded BFS searches for an eviction path.
    ///
    /// # Errors
    ///
    /// * [`ManuCuckooError::DuplicateKey`] if the key is present.
    /// * [`ManuCuckooError::CapacityExhausted`] if no eviction path exists
    ///   within the bound; the table is left unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let mut target: Option<(u32, usize)> = None;
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, &key);
            for slot in 0..SLOTS_PER_BUCKET {
                match &self.buckets[bucket as usize].slots[slot] {
                    Some(resident) if resident.key == key => {
                        return Err(ManuCuckooError::DuplicateKey);
                    }
                    Some(_) => {}
                    // Keep scanning: the duplicate check must complete.
                    None if target.is_none() => target = Some((bucket, slot)),
                    None => {}
                }
            }
        }

        if let Some((bucket, slot)) = target {
            self.place(key, value, bucket, slot);
            return Ok(());
        }
        self.cuckoo_insert(key, value)
    }

    /// Digest-guarded insert: refuses when any resident key in a candidate
    /// bucket shares the incoming key's data-plane digest, handing that
    /// resident back. A duplicate key surfaces as a collision with itself.
    ///
    /// # Errors
    ///
    /// [`ManuCuckooError::CapacityExhausted`] as for [`Self::insert`].
    pub fn insert_avoiding_digest_collision(
        &mut self,
        key: K,
        value: V,
    ) -> Result<DigestGuardedInsert<K>> {
        let digest = self.digest(&key);
        let mut target: Option<(u32, usize)> = None;
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, &key);
            for slot in 0..SLOTS_PER_BUCKET {
                match &self.buckets[bucket as usize].slots[slot] {
                    Some(resident) if self.digest(&resident.key) == digest => {
                        return Ok(DigestGuardedInsert::DigestCollision {
                            resident: resident.key.clone(),
                        });
                    }
                    Some(_) => {}
                    None if target.is_none() => target = Some((bucket, slot)),
                    None => {}
                }
            }
        }

        if let Some((bucket, slot)) = target {
            self.place(key, value, bucket, slot);
        } else {
            self.cuckoo_insert(key, value)?;
        }
        Ok(DigestGuardedInsert::Inserted)
    }

    /// Removes a key. Returns false if absent.
    pub fn remove(&mut self, key: &K) -> bool {
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, key) as usize;
            for slot in 0..SLOTS_PER_BUCKET {
                let occupied = matches!(
                    &self.buckets[bucket].slots[slot],
                    Some(resident) if resident.key == *key
                );
                if occupied {
                    self.buckets[bucket].slots[slot] = None;
                    self.entry_count -= 1;
                    return true;
                }
            }
        }
        false
    }

    /// Looks the key up in its candidate buckets.
    pub fn find(&self, key: &K) -> Option<V> {
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, key) as usize;
            for slot in self.buckets[bucket].slots.iter().flatten() {
                if slot.key == *key {
                    return Some(slot.value);
                }
            }
        }
        None
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Bulk value remap: every stored value present in `remap` is rewritten
    /// in place, or its slot freed when mapped to `None`. O(buckets).
    pub fn migrate(&mut self, remap: &HashMap<V, Option<V>>) {
        for bucket in &mut self.buckets {
            for slot in &mut bucket.slots {
                let Some(resident) = slot else { continue };
                match remap.get(&resident.value) {
                    Some(None) => {
                        *slot = None;
                        self.entry_count -= 1;
                    }
                    Some(Some(dst)) => resident.value = *dst,
                    None => {}
                }
            }
        }
    }

    /// Iterates live `(key, value)` pairs in bucket order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.slots.iter().flatten())
            .map(|slot| (&slot.key, slot.value))
    }

    /// Exports a digest-only data-plane snapshot: each occupied slot keeps
    /// its 16-bit digest and value, keys are dropped.
    pub fn export_data_plane(&self) -> CuckooDataPlane<V> {
        debug!(
            entries = self.entry_count,
            buckets = self.num_buckets,
            "exporting cuckoo data plane"
        );
        let buckets = self
            .buckets
            .iter()
            .map(|bucket| {
                std::array::from_fn(|i| {
                    bucket.slots[i]
                        .as_ref()
                        .map(|slot| (self.digest(&slot.key), slot.value))
                })
            })
            .collect();
        CuckooDataPlane::from_parts(self.hashers, self.digest_hasher, self.num_buckets, buckets)
    }

    /// Approximate heap bytes held by the table.
    pub fn memory_cost(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<Bucket<K, V>>()
            + self.queue.capacity() * std::mem::size_of::<PathEntry>()
            + self.visited.capacity() * std::mem::size_of::<PathEntry>()
    }

    /// Removes and returns every resident of `key`'s candidate buckets
    /// whose data-plane digest equals `key`'s. Used by the two-level
    /// composition to relocate an entire digest-collision group.
    pub(crate) fn take_digest_matches(&mut self, key: &K) -> Vec<(K, V)> {
        let digest = self.digest(key);
        let mut taken = Vec::new();
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, key) as usize;
            for slot_idx in 0..SLOTS_PER_BUCKET {
                let matches = matches!(
                    &self.buckets[bucket].slots[slot_idx],
                    Some(resident) if self.digest(&resident.key) == digest
                );
                if !matches {
                    continue;
                }
                if let Some(resident) = self.buckets[bucket].slots[slot_idx].take() {
                    self.entry_count -= 1;
                    taken.push((resident.key, resident.value));
                }
            }
        }
        taken
    }

    #[inline]
    fn bucket_index(&self, hasher: usize, key: &K) -> u32 {
        multiply_high_u32(self.hashers[hasher].hash(key), self.num_buckets)
    }

    /// Puts an entry back into a free candidate slot without duplicate
    /// scanning or eviction. Used to undo a partial relocation: the caller
    /// guarantees the entry's slot was vacated by [`take_digest_matches`]
    /// and nothing has been placed since.
    ///
    /// [`take_digest_matches`]: ManuCuckoo::take_digest_matches
    pub(crate) fn restore(&mut self, key: K, value: V) {
        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, &key);
            if let Some(slot) = self.free_slot(bucket) {
                self.place(key, value, bucket, slot);
                return;
            }
        }
        debug_assert!(false, "no free candidate slot for restored entry");
    }

    fn free_slot(&self, bucket: u32) -> Option<usize> {
        self.buckets[bucket as usize]
            .slots
            .iter()
            .position(Option::is_none)
    }

    fn place(&mut self, key: K, value: V, bucket: u32, slot: usize) {
        self.buckets[bucket as usize].slots[slot] = Some(Slot { key, value });
        self.entry_count += 1;
    }

    fn copy_slot(&mut self, src_bucket: u32, src_slot: usize, dst_bucket: u32, dst_slot: usize) {
        let moved = self.buckets[src_bucket as usize].slots[src_slot].clone();
        self.buckets[dst_bucket as usize].slots[dst_slot] = moved;
    }

    /// Bounded BFS for an eviction path rooted at the key's candidate
    /// buckets. The path is applied by copying each entry one hop toward
    /// the free slot (copy, not swap: the destination is always free),
    /// walking parent pointers back from the discovered free slot.
    fn cuckoo_insert(&mut self, key: K, value: V) -> Result<()> {
        self.queue.clear();
        self.visited.clear();

        for i in 0..CANDIDATE_BUCKETS {
            let bucket = self.bucket_index(i, &key);
            self.queue.push_back(PathEntry {
                bucket,
                depth: 1,
                parent: usize::MAX,
                parent_slot: 0,
            });
        }

        while let Some(mut entry) = self.queue.pop_front() {
            if let Some(mut free_slot) = self.free_slot(entry.bucket) {
                while entry.depth > 1 {
                    let parent = self.visited[entry.parent];
                    self.copy_slot(parent.bucket, entry.parent_slot, entry.bucket, free_slot);
                    free_slot = entry.parent_slot;
                    entry = parent;
                }
                self.place(key, value, entry.bucket, free_slot);
                return Ok(());
            }

            if entry.depth >= MAX_BFS_PATH_LEN {
                continue;
            }
            self.visited.push(entry);
            let parent_index = self.visited.len() - 1;

            // Rotate the starting slot so path depth evens out across slots.
            let start_slot = (entry.depth as usize + entry.bucket as usize) % SLOTS_PER_BUCKET;
            for i in 0..SLOTS_PER_BUCKET {
                let slot = (start_slot + i) % SLOTS_PER_BUCKET;
                let Some(resident) = &self.buckets[entry.bucket as usize].slots[slot] else {
                    continue;
                };
                let mut targets = [0u32; CANDIDATE_BUCKETS];
                for (j, target) in targets.iter_mut().enumerate() {
                    *target =
                        multiply_high_u32(self.hashers[j].hash(&resident.key), self.num_buckets);
                }
                for next_bucket in targets {
                    if next_bucket == entry.bucket {
                        continue;
                    }
                    self.queue.push_back(PathEntry {
                        bucket: next_bucket,
                        depth: entry.depth + 1,
                        parent: parent_index,
                        parent_slot: slot,
                    });
                }
            }
        }

        warn!(
            entries = self.entry_count,
            buckets = self.num_buckets,
            "cuckoo path search failed; table effectively full"
        );
        Err(ManuCuckooError::CapacityExhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(capacity: u32) -> ManuCuckoo<u64, u32> {
        ManuCuckoo::with_config(
            ManuCuckooConfig::new()
                .with_initial_capacity(capacity)
                .with_rng_seed(0xC0C0),
        )
        .expect("construction")
    }

    #[test]
    fn test_insert_find_remove() {
        let mut table = fresh(64);
        table.insert(1, 10).unwrap();
        table.insert(2, 20).unwrap();
        assert_eq!(table.find(&1), Some(10));
        assert_eq!(table.find(&2), Some(20));
        assert_eq!(table.find(&3), None);
        assert!(table.remove(&1));
        assert!(!table.remove(&1));
        assert_eq!(table.find(&1), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = fresh(64);
        table.insert(5, 1).unwrap();
        assert_eq!(table.insert(5, 2), Err(ManuCuckooError::DuplicateKey));
        assert_eq!(table.find(&5), Some(1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_fills_to_load_factor() {
        let capacity = 10_000u32;
        let mut table = fresh(capacity);
        for k in 0..u64::from(capacity) {
            table.insert(k, (k & 0xFFFF_FFFF) as u32).expect("insert within nominal capacity");
        }
        assert_eq!(table.len(), capacity as usize);
        for k in (0..u64::from(capacity)).step_by(211) {
            assert_eq!(table.find(&k), Some((k & 0xFFFF_FFFF) as u32));
        }
    }

    #[test]
    fn test_failed_insert_leaves_table_intact() {
        // Nominal capacity 16 gives ~50 real slots; overfill until failure.
        let mut table = fresh(16);
        let mut stored = Vec::new();
        let mut failed = false;
        for k in 0u64..10_000 {
            match table.insert(k, k as u32) {
                Ok(()) => stored.push(k),
                Err(ManuCuckooError::CapacityExhausted) => {
                    failed = true;
                    break;
                }
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert!(failed, "table never filled");
        assert_eq!(table.len(), stored.len());
        for k in &stored {
            assert_eq!(table.find(k), Some(*k as u32), "key {k}");
        }
    }

    #[test]
    fn test_eviction_preserves_prior_keys() {
        let mut table = fresh(100);
        for k in 0u64..100 {
            table.insert(k, k as u32).unwrap();
        }
        for k in 0u64..100 {
            assert_eq!(table.find(&k), Some(k as u32), "key {k}");
        }
    }

    #[test]
    fn test_digest_collision_surfaced() {
        let mut table = fresh(64);
        table.insert(77, 1).unwrap();
        // The key itself counts as a digest collision with its resident.
        assert_eq!(
            table.insert_avoiding_digest_collision(77, 2),
            Ok(DigestGuardedInsert::DigestCollision { resident: 77 })
        );
        assert_eq!(table.find(&77), Some(1));
    }

    #[test]
    fn test_migrate_rewrites_and_deletes() {
        let mut table = fresh(64);
        table.insert(1, 10).unwrap();
        table.insert(2, 20).unwrap();
        table.insert(3, 10).unwrap();

        let mut remap = HashMap::new();
        remap.insert(10u32, None);
        remap.insert(20u32, Some(99u32));
        table.migrate(&remap);

        assert_eq!(table.find(&1), None);
        assert_eq!(table.find(&3), None);
        assert_eq!(table.find(&2), Some(99));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_clear_reprimes() {
        let mut table = fresh(64);
        for k in 0u64..50 {
            table.insert(k, 1).unwrap();
        }
        table.clear(128);
        assert!(table.is_empty());
        assert_eq!(table.find(&1), None);
        table.insert(1, 2).unwrap();
        assert_eq!(table.find(&1), Some(2));
    }

    #[test]
    fn test_entries_iteration() {
        let mut table = fresh(64);
        for k in 0u64..20 {
            table.insert(k, k as u32).unwrap();
        }
        let mut seen: Vec<u64> = table.entries().map(|(k, _)| *k).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0u64..20).collect::<Vec<_>>());
    }
}
