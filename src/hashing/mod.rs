// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Seeded hashing utilities shared by both lookup engines.
//!
//! Every engine needs a small family of independent, re-seedable 32-bit
//! hash functions: two node hashes plus a digest hash for the Othello
//! construction, four candidate-bucket hashes plus a digest hash for the
//! cuckoo map. A rebuild swaps seeds, not hash algorithms, so the hasher is
//! a value type that can be copied into data-plane snapshots.

use std::hash::{Hash, Hasher};

use fnv::FnvHasher;

/// A re-seedable hash function producing 32-bit values for any `Hash` key.
///
/// Built on FNV-1a with the seed folded into the initial state. FNV is weak
/// on short keys when used raw, so the 64-bit result is finalized with an
/// avalanche step before truncation to 32 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededHasher32 {
    seed: u64,
}

impl SeededHasher32 {
    /// FNV-1a 64-bit offset basis; the seed perturbs this value.
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

    /// Creates a hasher with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Replaces the seed, yielding an independent hash function.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    /// Returns the current seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Hashes `key` to a 32-bit value.
    pub fn hash<K: Hash + ?Sized>(&self, key: &K) -> u32 {
        let mut hasher = FnvHasher::with_key(Self::FNV_OFFSET ^ self.seed);
        key.hash(&mut hasher);
        let mut h = hasher.finish();

        // xorshift-multiply finalizer; FNV alone mixes low bits poorly.
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        (h ^ (h >> 32)) as u32
    }
}

impl Default for SeededHasher32 {
    fn default() -> Self {
        Self::new(0xe2211)
    }
}

/// Maps a uniform 32-bit hash to `[0, n)` with Lemire's multiply-high
/// reduction: `(x * n) >> 32` instead of `x % n`.
///
/// Avoids a division and avoids modulo bias when `n` is not a power of two.
#[inline]
pub fn multiply_high_u32(x: u32, n: u32) -> u32 {
    ((u64::from(x) * u64::from(n)) >> 32) as u32
}
