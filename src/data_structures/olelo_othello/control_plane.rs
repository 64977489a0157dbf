// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Control-plane Othello map.
//!
//! Tracks connections with O(1) insert, remove and membership judgment, and
//! can iterate its keys. Each key contributes one edge to an acyclic hash
//! graph; per-node cells are assigned so that the XOR of a key's two
//! endpoint cells reproduces `(value << DL) | digest`, and a parallel index
//! memory reproduces the key's position in the dense key array the same way.
//!
//! Inserting an edge between two already-connected nodes would close a
//! cycle, which the XOR constraint system cannot satisfy; such inserts
//! trigger a full rebuild under fresh hash seeds. Deletion never adds
//! edges, so it never rebuilds.

use std::collections::HashMap;
use std::hash::Hash;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::data_structures::olelo_othello::bit_store::BitPackedStore;
use crate::data_structures::olelo_othello::config::OleloOthelloConfig;
use crate::data_structures::olelo_othello::data_plane::OthelloDataPlane;
use crate::data_structures::olelo_othello::disjoint_set::DisjointSet;
use crate::data_structures::olelo_othello::error::{OleloOthelloError, Result};
use crate::data_structures::olelo_othello::graph::HashGraph;
use crate::hashing::{multiply_high_u32, SeededHasher32};

/// Maximum number of hash-seed retries before a build is declared failed.
pub const MAX_REHASH: u32 = 50;

/// Lower `bits` bits set.
#[inline]
fn low_mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// The mutable Othello map: full keys and values, hash graph, index memory
/// and (optionally) the bit-packed cell store the data plane queries.
///
/// # Type Parameters
///
/// * `K` - The key type. Must implement `Hash + Eq + Clone`.
///
/// Values are `u64` payloads of the configured width.
#[derive(Debug, Clone)]
pub struct OleloOthello<K> {
    config: OleloOthelloConfig,

    hasher_a: SeededHasher32,
    hasher_b: SeededHasher32,
    hasher_d: SeededHasher32,

    /// Cell counts of array A and array B; nodes `[0, ma)` are A-side,
    /// `[ma, ma + mb)` B-side.
    ma: u32,
    mb: u32,

    keys: Vec<K>,
    values: Vec<u64>,
    /// Cached (a, b) endpoint nodes per key, rebuilt on re-seed.
    endpoints: Vec<(u32, u32)>,

    /// `index_mem[a] ^ index_mem[b]` recovers a key's dense array index.
    index_mem: Vec<u32>,
    /// `cells[a] ^ cells[b]` recovers `(value << DL) | digest` when the
    /// data plane is being maintained.
    cells: BitPackedStore,

    graph: HashGraph,
    forest: DisjointSet,

    minimal_capacity: u32,
    key_capacity: u32,
    maintaining_dp: bool,

    rng: StdRng,
    rebuild_count: u64,
}

impl<K> OleloOthello<K>
where
    K: Hash + Eq + Clone,
{
    /// Creates a map sized for `capacity` keys with default configuration.
    pub fn new(capacity: u32) -> Result<Self> {
        Self::with_config(OleloOthelloConfig::new().with_initial_capacity(capacity))
    }

    /// Creates a map with the given configuration.
    pub fn with_config(config: OleloOthelloConfig) -> Result<Self> {
        config.validate()?;

        let mut minimal_capacity = 256u32;
        while minimal_capacity < config.initial_capacity {
            minimal_capacity <<= 1;
        }

        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cell_bits = config.value_bits + config.digest_bits;
        let maintaining_dp = config.maintain_data_plane;

        let mut map = Self {
            hasher_a: SeededHasher32::new(rng.gen()),
            hasher_b: SeededHasher32::new(rng.gen()),
            hasher_d: SeededHasher32::new(rng.gen()),
            ma: 0,
            mb: 0,
            keys: Vec::new(),
            values: Vec::new(),
            endpoints: Vec::new(),
            index_mem: Vec::new(),
            cells: BitPackedStore::new(cell_bits),
            graph: HashGraph::new(),
            forest: DisjointSet::new(0),
            minimal_capacity,
            key_capacity: 0,
            maintaining_dp,
            rng,
            rebuild_count: 0,
            config,
        };
        // An empty build cannot exhaust the rehash budget.
        map.resize_key(0)?;
        Ok(map)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Configured value width in bits.
    pub fn value_bits(&self) -> u8 {
        self.config.value_bits
    }

    /// Configured digest width in bits.
    pub fn digest_bits(&self) -> u8 {
        self.config.digest_bits
    }

    /// Number of full hash-seed rebuilds performed so far. Grows only when
    /// an insert closes a cycle or the structure is resized; deletions
    /// never rebuild.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuild_count
    }

    /// Live keys in dense-array order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Iterates live `(key, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&K, u64)> {
        self.keys.iter().zip(self.values.iter().copied())
    }

    /// Inserts a key-value pair.
    ///
    /// Amortized O(tree size); triggers a full rebuild only when the new
    /// edge would close a cycle in the hash graph.
    ///
    /// # Errors
    ///
    /// * [`OleloOthelloError::DuplicateKey`] if the key is present.
    /// * [`OleloOthelloError::ValueTooWide`] if the value exceeds the
    ///   configured width.
    /// * [`OleloOthelloError::RebuildExhausted`] if a forced rebuild fails
    ///   for every tried seed pair; the map must then be discarded.
    pub fn insert(&mut self, key: K, value: u64) -> Result<()> {
        if value > low_mask(self.config.value_bits) {
            return Err(OleloOthelloError::ValueTooWide {
                value_bits: self.config.value_bits,
            });
        }
        if self.contains(&key) {
            return Err(OleloOthelloError::DuplicateKey);
        }
        if self.keys.len() as u32 >= self.key_capacity {
            self.resize_key(self.keys.len() as u32 + 1)?;
        }

        let a = self.index_a(&key);
        let b = self.index_b(&key);
        let key_id = self.keys.len() as u32;
        self.keys.push(key);
        self.values.push(value);
        self.endpoints.push((a, b));

        if self.forest.same_set(a, b) {
            debug!(keys = self.keys.len(), "othello insert closed a cycle, rebuilding");
            if let Err(err) = self.build() {
                self.keys.pop();
                self.values.pop();
                self.endpoints.pop();
                return Err(err);
            }
        } else {
            self.graph.add_edge(key_id, a, b);
            self.forest.merge(a, b);
            // A previously-unwritten opposite node carries no constraints
            // yet, so its written flag can be raised before the fix reads it.
            if self.maintaining_dp && self.config.digest_bits > 0 {
                let bb = self.cells.get(b as usize);
                if bb & 1 == 0 {
                    self.cells.set(b as usize, bb | 1);
                }
            }
            let fill_value = self.maintaining_dp;
            self.fix_half_tree(key_id, a, b, fill_value, true, false);
        }
        Ok(())
    }

    /// Removes a key. Returns false if absent. Never rebuilds.
    pub fn remove(&mut self, key: &K) -> bool {
        let index = self.query_index(key) as usize;
        if index >= self.keys.len() || self.keys[index] != *key {
            return false;
        }
        self.erase_at(index);
        true
    }

    /// Looks up a key through the index memory and verifies it against the
    /// stored key array. Total: returns `None` for any non-member.
    pub fn get(&self, key: &K) -> Option<u64> {
        let index = self.query_index(key) as usize;
        if index < self.keys.len() && self.keys[index] == *key {
            Some(self.values[index])
        } else {
            None
        }
    }

    /// True if the key is stored.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// XOR-of-cells lookup against the maintained cell store, with no key
    /// comparison. For a non-member this returns an arbitrary value; callers
    /// that cannot guarantee membership need digest bits and should query
    /// the exported data plane instead. Only meaningful when the data plane
    /// is maintained.
    pub fn query_unchecked(&self, key: &K) -> u64 {
        debug_assert!(
            self.maintaining_dp,
            "query_unchecked requires maintain_data_plane"
        );
        let (a, b) = (self.index_a(key), self.index_b(key));
        let vd = self.cells.get(a as usize) ^ self.cells.get(b as usize);
        vd >> self.config.digest_bits
    }

    /// Recovers the key's dense-array index from the index memory. The
    /// result is meaningful only for members; callers keeping parallel
    /// per-connection state validate it against [`Self::keys`].
    pub fn query_index(&self, key: &K) -> u32 {
        let (a, b) = (self.index_a(key), self.index_b(key));
        self.index_mem[a as usize] ^ self.index_mem[b as usize]
    }

    /// Rewrites the value of an existing key in place, repairing the cell
    /// store with a digest-preserving half-tree fix. Returns false if the
    /// key is absent.
    pub fn update_value(&mut self, key: &K, value: u64) -> Result<bool> {
        if value > low_mask(self.config.value_bits) {
            return Err(OleloOthelloError::ValueTooWide {
                value_bits: self.config.value_bits,
            });
        }
        let index = self.query_index(key) as usize;
        if index >= self.keys.len() || self.keys[index] != *key {
            return Ok(false);
        }
        self.update_value_at(index, value);
        Ok(true)
    }

    /// Bulk value remap: every stored value present as a key in `migration`
    /// is rewritten in place, or its entry deleted when mapped to `None`.
    ///
    /// O(n) over live keys; never touches the hash graph, so it cannot
    /// trigger a rebuild. Replacement values are truncated to the
    /// configured value width.
    pub fn compose(&mut self, migration: &HashMap<u64, Option<u64>>) {
        let mask = low_mask(self.config.value_bits);
        let mut i = 0;
        while i < self.values.len() {
            if let Some(&dst) = migration.get(&self.values[i]) {
                match dst {
                    None => {
                        // Swap-with-last moved a new entry into slot i.
                        self.erase_at(i);
                        continue;
                    }
                    Some(d) => self.values[i] = d & mask,
                }
            }
            i += 1;
        }
        if self.maintaining_dp {
            self.fill_all_values(true);
        }
    }

    /// Raises the floor the map never shrinks below, resizing immediately.
    pub fn set_minimum_capacity(&mut self, capacity: u32) -> Result<()> {
        let mut minimal = 256u32;
        while minimal < capacity {
            minimal <<= 1;
        }
        self.minimal_capacity = minimal;
        self.resize_key(0)
    }

    /// Resizes key and hash-array memory to hold `capacity` keys,
    /// rebuilding if the hash arrays change.
    pub fn resize(&mut self, capacity: u32) -> Result<()> {
        self.resize_key(capacity)
    }

    /// Exports an immutable data-plane snapshot. When the cell store is not
    /// maintained incrementally it is filled here in one pass.
    pub fn export_data_plane(&mut self) -> OthelloDataPlane {
        if !self.config.maintain_data_plane {
            self.maintaining_dp = true;
            self.cells.resize((self.ma + self.mb) as usize);
            self.fill_all_values(false);
            self.maintaining_dp = false;
        }
        debug!(
            keys = self.keys.len(),
            ma = self.ma,
            mb = self.mb,
            "exporting othello data plane"
        );
        OthelloDataPlane::from_parts(
            self.ma,
            self.mb,
            self.hasher_a,
            self.hasher_b,
            self.hasher_d,
            self.cells.clone(),
            self.config.value_bits,
            self.config.digest_bits,
        )
    }

    /// Approximate heap bytes held by the control plane.
    pub fn memory_cost(&self) -> usize {
        self.cells.memory_bytes()
            + self.keys.capacity() * std::mem::size_of::<K>()
            + self.values.capacity() * std::mem::size_of::<u64>()
            + self.endpoints.capacity() * std::mem::size_of::<(u32, u32)>()
            + self.index_mem.capacity() * std::mem::size_of::<u32>()
            + self.graph.memory_bytes()
            + self.forest.memory_bytes()
    }

    /// True if inserting this key now would close a cycle and force a full
    /// rebuild. Used by the two-level wrapper to pin such keys to the
    /// overflow tier instead.
    pub(crate) fn would_close_cycle(&self, key: &K) -> bool {
        self.forest.same_set(self.index_a(key), self.index_b(key))
    }

    // ---- hashing -----------------------------------------------------

    #[inline]
    fn index_a(&self, key: &K) -> u32 {
        multiply_high_u32(self.hasher_a.hash(key), self.ma)
    }

    #[inline]
    fn index_b(&self, key: &K) -> u32 {
        self.ma + multiply_high_u32(self.hasher_b.hash(key), self.mb)
    }

    // ---- sizing and build --------------------------------------------

    /// Resizes for `key_count` keys. `mb` is the power of two reaching the
    /// count, `ma ≈ 1.333 × mb`; changing either rebuilds from scratch.
    fn resize_key(&mut self, key_count: u32) -> Result<()> {
        let key_count = key_count.max(self.minimal_capacity);
        if key_count < self.keys.len() as u32 {
            return Err(OleloOthelloError::CapacityBelowSize {
                requested: key_count,
                current: self.keys.len() as u32,
            });
        }

        let mut next_mb = self.minimal_capacity;
        while next_mb < key_count {
            next_mb <<= 1;
        }
        let next_ma = (1.33334 * f64::from(next_mb)) as u32;

        if key_count > self.key_capacity {
            let reserve = 256.max(key_count.saturating_mul(2)) as usize;
            self.keys.reserve(reserve.saturating_sub(self.keys.len()));
            self.values.reserve(reserve.saturating_sub(self.values.len()));
            self.key_capacity = reserve as u32;
        }

        if next_ma > self.ma || f64::from(next_ma) < 0.8 * f64::from(self.ma) {
            self.ma = next_ma;
            self.mb = next_mb;
            let nodes = (self.ma + self.mb) as usize;
            if self.maintaining_dp {
                self.cells.resize(nodes);
            }
            self.index_mem.resize(nodes, 0);
            self.graph.resize_nodes(nodes, self.ma);
            self.forest.resize(nodes);
            self.build()?;
        }
        Ok(())
    }

    /// Retries seed pairs until an acyclic hash graph is found, then fills
    /// every cell. Fails after [`MAX_REHASH`] attempts.
    fn build(&mut self) -> Result<()> {
        if !self.keys.is_empty() {
            self.rebuild_count += 1;
        }
        let mut try_count = 0u32;
        loop {
            try_count += 1;
            self.hasher_a.set_seed(self.rng.gen());
            self.hasher_b.set_seed(self.rng.gen());
            if try_count > 20 && try_count.is_power_of_two() {
                warn!(
                    tries = try_count,
                    keys = self.keys.len(),
                    ma = self.ma,
                    mb = self.mb,
                    "othello build still retrying"
                );
            }
            if self.try_build() {
                debug!(tries = try_count, keys = self.keys.len(), "othello build complete");
                return Ok(());
            }
            if try_count >= MAX_REHASH {
                warn!(attempts = try_count, keys = self.keys.len(), "othello build failed");
                return Err(OleloOthelloError::RebuildExhausted { attempts: try_count });
            }
        }
    }

    fn try_build(&mut self) -> bool {
        self.reset_build_state();
        if self.keys.is_empty() {
            return true;
        }
        if !self.test_hash() {
            return false;
        }
        self.fill_all_values(false);
        true
    }

    /// Discards adjacency, connectivity and cell state ahead of a build.
    fn reset_build_state(&mut self) {
        if self.maintaining_dp {
            if self.config.randomized_fill {
                let vd_mask = low_mask(self.cells.cell_bits());
                for i in 0..(self.ma + self.mb) as usize {
                    // Low bit clear marks a never-written cell.
                    self.cells.set(i, self.rng.gen::<u64>() & vd_mask & !1);
                }
            } else {
                self.cells.clear();
            }
        }
        self.graph.reset();
        self.forest.reset();
    }

    /// Replays every key against the current seed pair, recording edges.
    /// Fails as soon as a key would close a cycle.
    fn test_hash(&mut self) -> bool {
        for i in 0..self.keys.len() {
            let a = self.index_a(&self.keys[i]);
            let b = self.index_b(&self.keys[i]);
            self.endpoints[i] = (a, b);
            if self.forest.same_set(a, b) {
                return false;
            }
            self.graph.add_edge(i as u32, a, b);
            self.forest.merge(a, b);
        }
        true
    }

    /// Fills cell values and index memory for every connected component.
    ///
    /// A component with c nodes has c − 1 independent XOR constraints, so
    /// each tree is filled from its root outward. With `keep_digest` the
    /// digest bits already in place are preserved and only value fields are
    /// rewritten (used after compose), so roots are not re-initialized.
    fn fill_all_values(&mut self, keep_digest: bool) {
        let randomized = self.config.randomized_fill;
        let seed_roots = !keep_digest
            && self.maintaining_dp
            && (self.config.digest_bits > 0 || randomized);
        for node in 0..(self.ma + self.mb) {
            if !self.forest.is_root(node) {
                continue;
            }
            if seed_roots {
                // Low bit set marks a written cell.
                let v = if randomized { self.rng.gen::<u64>() | 1 } else { 1 };
                self.cells.set(node as usize, v);
            }
            self.fill_tree(node, keep_digest);
        }
    }

    /// Fills every node of the tree rooted at `root`, leaf-ward, so each
    /// edge's XOR constraint holds.
    fn fill_tree(&mut self, root: u32, keep_digest: bool) {
        let maintaining = self.maintaining_dp;
        let value_bits = self.config.value_bits;
        let digest_bits = self.config.digest_bits;
        let Self {
            graph,
            endpoints,
            cells,
            index_mem,
            keys,
            values,
            hasher_d,
            ..
        } = self;
        graph.walk_tree(-1, root, endpoints, |key, from, to| {
            fill_cell(
                cells, index_mem, keys, values, hasher_d, maintaining, value_bits, digest_bits,
                key, to, from, true, true, keep_digest,
            );
        });
    }

    /// Repairs values/indices after a single edge changed: sets the root
    /// node to satisfy the changed edge, then XORs the resulting delta into
    /// every node on the root's side of the tree (adding an edge to an
    /// acyclic graph merges two trees, so one side shifts by a constant).
    fn fix_half_tree(
        &mut self,
        key_id: u32,
        root: u32,
        opposite: u32,
        fill_value: bool,
        fill_index: bool,
        keep_digest: bool,
    ) {
        let maintaining = self.maintaining_dp;
        let value_bits = self.config.value_bits;
        let digest_bits = self.config.digest_bits;
        let fill_value = fill_value && maintaining;

        let read_cell = |cells: &BitPackedStore| {
            if keep_digest {
                cells.get_field(root as usize, digest_bits, value_bits)
            } else {
                cells.get(root as usize)
            }
        };

        let x0 = if fill_value { read_cell(&self.cells) } else { 0 };
        let ix0 = if fill_index {
            self.index_mem[root as usize]
        } else {
            0
        };

        {
            let Self {
                cells,
                index_mem,
                keys,
                values,
                hasher_d,
                ..
            } = self;
            fill_cell(
                cells, index_mem, keys, values, hasher_d, maintaining, value_bits, digest_bits,
                key_id, root, opposite, fill_value, fill_index, keep_digest,
            );
        }

        let x = if fill_value {
            x0 ^ read_cell(&self.cells)
        } else {
            0
        };
        let ix = if fill_index {
            ix0 ^ self.index_mem[root as usize]
        } else {
            0
        };
        if x == 0 && ix == 0 {
            return;
        }

        let Self {
            graph,
            endpoints,
            cells,
            index_mem,
            ..
        } = self;
        graph.walk_tree(key_id as i32, root, endpoints, |_key, _from, to| {
            if fill_value {
                if keep_digest {
                    let cur = cells.get_field(to as usize, digest_bits, value_bits);
                    cells.set_field(to as usize, digest_bits, value_bits, cur ^ x);
                } else {
                    let cur = cells.get(to as usize);
                    cells.set(to as usize, cur ^ x);
                }
            }
            if fill_index {
                index_mem[to as usize] ^= ix;
            }
        });
    }

    // ---- mutation internals ------------------------------------------

    pub(crate) fn update_value_at(&mut self, key_id: usize, value: u64) {
        self.values[key_id] = value;
        if self.maintaining_dp {
            let (a, b) = self.endpoints[key_id];
            self.fix_half_tree(key_id as u32, a, b, true, false, true);
        }
    }

    /// Removes the key at dense index `key_id`: unsplice its edge, move the
    /// last key into the freed slot, repair the moved key's list entries,
    /// re-root the two affected components and repair the index mapping.
    pub(crate) fn erase_at(&mut self, key_id: usize) {
        let (a, b) = self.endpoints[key_id];
        self.graph.remove_edge(key_id as u32, a, b);

        let last = self.keys.len() - 1;
        if key_id != last {
            let (la, lb) = self.endpoints[last];
            self.graph.relink_moved_key(last as u32, key_id as u32, la, lb);
        }
        self.keys.swap_remove(key_id);
        self.values.swap_remove(key_id);
        self.endpoints.swap_remove(key_id);

        // The removed edge split one component in two; re-root both halves.
        self.connect_component(a);
        self.connect_component(b);

        if key_id != last {
            let (la, lb) = self.endpoints[key_id];
            self.fix_half_tree(key_id as u32, la, lb, false, true, true);
        }
    }

    /// Marks every node reachable from `root` as belonging to `root`'s
    /// component. A node left isolated gets its cell reset to the unwritten
    /// marker.
    fn connect_component(&mut self, root: u32) {
        self.forest.assign_root(root, root);
        if self.graph.is_isolated(root) {
            if self.maintaining_dp {
                let v = if self.config.randomized_fill {
                    self.rng.gen::<u64>() & !1
                } else {
                    0
                };
                self.cells.set(root as usize, v);
            }
            return;
        }
        let Self {
            graph,
            endpoints,
            forest,
            ..
        } = self;
        graph.walk_tree(-1, root, endpoints, |_key, _from, to| {
            forest.assign_root(to, root);
        });
    }
}

/// Writes one node so the edge of `key` holds: the cell (and/or index) at
/// `node_to_fill` becomes the key's constraint XOR the opposite endpoint.
#[allow(clippy::too_many_arguments)]
fn fill_cell<K: Hash>(
    cells: &mut BitPackedStore,
    index_mem: &mut [u32],
    keys: &[K],
    values: &[u64],
    hasher_d: &SeededHasher32,
    maintaining: bool,
    value_bits: u8,
    digest_bits: u8,
    key: u32,
    node_to_fill: u32,
    opposite: u32,
    fill_value: bool,
    fill_index: bool,
    keep_digest: bool,
) {
    let key_idx = key as usize;
    if fill_value && maintaining {
        if keep_digest {
            let v = values[key_idx] ^ cells.get_field(opposite as usize, digest_bits, value_bits);
            cells.set_field(node_to_fill as usize, digest_bits, value_bits, v);
        } else if digest_bits > 0 {
            let de_mask = low_mask(digest_bits);
            let digest = u64::from(hasher_d.hash(&keys[key_idx])) & de_mask;
            let vd = (values[key_idx] << digest_bits) | digest;
            // Force the written bit so default-zero memory stays detectable.
            cells.set(node_to_fill as usize, (vd ^ cells.get(opposite as usize)) | 1);
        } else {
            cells.set(
                node_to_fill as usize,
                values[key_idx] ^ cells.get(opposite as usize),
            );
        }
    }
    if fill_index {
        index_mem[node_to_fill as usize] = key ^ index_mem[opposite as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(capacity: u32) -> OleloOthello<u64> {
        OleloOthello::with_config(
            OleloOthelloConfig::new()
                .with_initial_capacity(capacity)
                .with_rng_seed(0xA10A),
        )
        .expect("construction")
    }

    #[test]
    fn test_insert_and_get() {
        let mut map = fresh(256);
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        assert_eq!(map.get(&1), Some(10));
        assert_eq!(map.get(&2), Some(20));
        assert_eq!(map.get(&3), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut map = fresh(256);
        map.insert(7, 1).unwrap();
        assert_eq!(map.insert(7, 2), Err(OleloOthelloError::DuplicateKey));
        assert_eq!(map.get(&7), Some(1));
    }

    #[test]
    fn test_value_too_wide_rejected() {
        let mut map = OleloOthello::<u64>::with_config(
            OleloOthelloConfig::new().with_value_bits(4).with_rng_seed(1),
        )
        .unwrap();
        assert!(matches!(
            map.insert(1, 16),
            Err(OleloOthelloError::ValueTooWide { value_bits: 4 })
        ));
        map.insert(1, 15).unwrap();
    }

    #[test]
    fn test_remove_then_requery() {
        let mut map = fresh(256);
        map.insert(1, 1).unwrap();
        map.insert(2, 2).unwrap();
        map.insert(3, 3).unwrap();
        assert!(map.remove(&2));
        assert!(!map.remove(&2));
        assert_eq!(map.get(&1), Some(1));
        assert_eq!(map.get(&2), None);
        assert_eq!(map.get(&3), Some(3));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_many_keys_round_trip() {
        let mut map = fresh(256);
        for k in 0u64..1000 {
            map.insert(k, k % 31).unwrap();
        }
        for k in 0u64..1000 {
            assert_eq!(map.get(&k), Some(k % 31), "key {k}");
        }
    }

    #[test]
    fn test_growth_past_initial_capacity() {
        let mut map = fresh(256);
        for k in 0u64..5000 {
            map.insert(k, k & 0xFFFF).unwrap();
        }
        assert_eq!(map.len(), 5000);
        for k in (0u64..5000).step_by(97) {
            assert_eq!(map.get(&k), Some(k & 0xFFFF));
        }
    }

    #[test]
    fn test_deletion_never_rebuilds() {
        let mut map = fresh(1024);
        for k in 0u64..900 {
            map.insert(k, k).unwrap();
        }
        let rebuilds_after_inserts = map.rebuild_count();
        for k in (0u64..900).step_by(2) {
            assert!(map.remove(&k));
        }
        assert_eq!(map.rebuild_count(), rebuilds_after_inserts);
        for k in (1u64..900).step_by(2) {
            assert_eq!(map.get(&k), Some(k));
        }
    }

    #[test]
    fn test_interleaved_inserts_and_removes() {
        let mut map = fresh(512);
        for round in 0u64..10 {
            for k in 0..200 {
                map.insert(round * 1000 + k, k).unwrap();
            }
            for k in 0..100 {
                assert!(map.remove(&(round * 1000 + k)));
            }
        }
        assert_eq!(map.len(), 1000);
        for round in 0u64..10 {
            for k in 100..200 {
                assert_eq!(map.get(&(round * 1000 + k)), Some(k));
            }
        }
    }

    #[test]
    fn test_update_value() {
        let mut map = fresh(256);
        map.insert(5, 50).unwrap();
        assert!(map.update_value(&5, 55).unwrap());
        assert!(!map.update_value(&6, 66).unwrap());
        assert_eq!(map.get(&5), Some(55));
    }

    #[test]
    fn test_compose_rewrites_and_deletes() {
        let mut map = fresh(256);
        map.insert(1, 10).unwrap();
        map.insert(2, 20).unwrap();
        map.insert(3, 10).unwrap();

        let mut migration = HashMap::new();
        migration.insert(10u64, None);
        migration.insert(20u64, Some(99u64));
        map.compose(&migration);

        assert_eq!(map.get(&1), None);
        assert_eq!(map.get(&3), None);
        assert_eq!(map.get(&2), Some(99));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_compose_disjoint_domains_one_pass_equivalent() {
        let build = || {
            let mut map = fresh(256);
            for k in 0u64..50 {
                map.insert(k, k % 8).unwrap();
            }
            map
        };

        // m1 outputs land in 100.. and m2 inputs stay below 8.
        let mut m1 = HashMap::new();
        m1.insert(3u64, Some(103u64));
        let mut m2 = HashMap::new();
        m2.insert(5u64, Some(105u64));

        let mut sequential = build();
        sequential.compose(&m1);
        sequential.compose(&m2);

        let mut union = HashMap::new();
        union.extend(m1);
        union.extend(m2);
        let mut combined = build();
        combined.compose(&union);

        for k in 0u64..50 {
            assert_eq!(sequential.get(&k), combined.get(&k), "key {k}");
        }
    }

    #[test]
    fn test_maintained_data_plane_query_unchecked() {
        let mut map = OleloOthello::<u64>::with_config(
            OleloOthelloConfig::new()
                .with_initial_capacity(256)
                .with_data_plane(true)
                .with_rng_seed(7),
        )
        .unwrap();
        for k in 0u64..300 {
            map.insert(k, (k * 3) & 0xFFFF).unwrap();
        }
        for k in (100u64..200).step_by(7) {
            map.remove(&k);
        }
        for k in 0u64..300 {
            if map.contains(&k) {
                assert_eq!(map.query_unchecked(&k), (k * 3) & 0xFFFF, "key {k}");
            }
        }
    }

    #[test]
    fn test_query_index_tracks_dense_slots() {
        let mut map = fresh(256);
        for k in 0u64..100 {
            map.insert(k, k).unwrap();
        }
        map.remove(&10);
        map.remove(&50);
        for (i, key) in map.keys().iter().enumerate() {
            assert_eq!(map.query_index(key) as usize, i, "key {key}");
        }
    }

    #[test]
    fn test_memory_cost_nonzero() {
        let map = fresh(256);
        assert!(map.memory_cost() > 0);
    }
}
