// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Read-only Othello query structure.
//!
//! Holds only the two seeded hashers and the bit-packed cell arrays; no
//! keys are stored. A query costs two hashes and two memory reads. With
//! digest bits configured, queries against keys that were never inserted
//! are rejected with probability `1 - 2^-(DL-1)`; without them, a
//! non-member query returns an arbitrary value.

use std::hash::Hash;

use crate::data_structures::olelo_othello::bit_store::BitPackedStore;
use crate::hashing::{multiply_high_u32, SeededHasher32};

/// Immutable data-plane snapshot exported by
/// [`OleloOthello::export_data_plane`](super::OleloOthello::export_data_plane).
#[derive(Debug, Clone)]
pub struct OthelloDataPlane {
    ma: u32,
    mb: u32,
    hasher_a: SeededHasher32,
    hasher_b: SeededHasher32,
    hasher_d: SeededHasher32,
    cells: BitPackedStore,
    value_bits: u8,
    digest_bits: u8,
}

impl OthelloDataPlane {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        ma: u32,
        mb: u32,
        hasher_a: SeededHasher32,
        hasher_b: SeededHasher32,
        hasher_d: SeededHasher32,
        cells: BitPackedStore,
        value_bits: u8,
        digest_bits: u8,
    ) -> Self {
        Self {
            ma,
            mb,
            hasher_a,
            hasher_b,
            hasher_d,
            cells,
            value_bits,
            digest_bits,
        }
    }

    /// Value width in bits.
    pub fn value_bits(&self) -> u8 {
        self.value_bits
    }

    /// Digest width in bits (0 disables filtering).
    pub fn digest_bits(&self) -> u8 {
        self.digest_bits
    }

    /// Queries a key. `None` means the digest filter rejected it; `Some`
    /// means the digest matched, which for a non-member is still possible
    /// with probability `2^-(DL-1)`.
    pub fn query<K: Hash + ?Sized>(&self, key: &K) -> Option<u64> {
        let a = multiply_high_u32(self.hasher_a.hash(key), self.ma) as usize;
        let b = (self.ma + multiply_high_u32(self.hasher_b.hash(key), self.mb)) as usize;
        let aa = self.cells.get(a);
        let bb = self.cells.get(b);
        let vd = aa ^ bb;
        let value = vd >> self.digest_bits;

        if self.digest_bits == 0 {
            return Some(value);
        }
        // Both cells must carry the written flag.
        if aa & 1 == 0 || bb & 1 == 0 {
            return None;
        }
        if self.digest_bits == 1 {
            return Some(value);
        }
        let de_mask = (1u64 << self.digest_bits) - 1;
        let digest = vd & de_mask;
        let expected = u64::from(self.hasher_d.hash(key)) & de_mask;
        // Bit 0 is the written flag, not part of the digest compare.
        if (digest | 1) == (expected | 1) {
            Some(value)
        } else {
            None
        }
    }

    /// XOR-of-cells lookup with no digest filtering. Meaningful only for
    /// keys known to be members.
    pub fn query_unchecked<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        let a = multiply_high_u32(self.hasher_a.hash(key), self.ma) as usize;
        let b = (self.ma + multiply_high_u32(self.hasher_b.hash(key), self.mb)) as usize;
        (self.cells.get(a) ^ self.cells.get(b)) >> self.digest_bits
    }

    /// Heap bytes held by the cell store.
    pub fn memory_cost(&self) -> usize {
        self.cells.memory_bytes()
    }
}
