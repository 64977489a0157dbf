// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Configuration options for the Olelo Othello map.

use crate::data_structures::olelo_othello::error::{OleloOthelloError, Result};

/// Configuration for the Olelo Othello map.
#[derive(Debug, Clone)]
pub struct OleloOthelloConfig {
    /// Initial key capacity. Rounded up to a power of two, minimum 256.
    pub initial_capacity: u32,

    /// Number of value bits (L) stored per key. 1 to 64.
    pub value_bits: u8,

    /// Number of digest bits (DL) folded into each cell for probabilistic
    /// membership filtering. 0 disables filtering; queries for non-members
    /// then return an arbitrary value.
    pub digest_bits: u8,

    /// Whether to keep the bit-packed cell store updated on every mutation.
    /// Makes exports cheap at the cost of extra work per insert/remove.
    pub maintain_data_plane: bool,

    /// Fill unconstrained cells pseudo-randomly instead of with zero, so
    /// unoccupied regions of the exported data plane carry no pattern.
    pub randomized_fill: bool,

    /// Fixed RNG seed for hash-seed generation. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl OleloOthelloConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial key capacity.
    pub fn with_initial_capacity(mut self, initial_capacity: u32) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the number of value bits stored per key.
    pub fn with_value_bits(mut self, value_bits: u8) -> Self {
        self.value_bits = value_bits;
        self
    }

    /// Sets the number of digest bits folded into each cell.
    pub fn with_digest_bits(mut self, digest_bits: u8) -> Self {
        self.digest_bits = digest_bits;
        self
    }

    /// Sets whether the cell store is maintained on every mutation.
    pub fn with_data_plane(mut self, maintain_data_plane: bool) -> Self {
        self.maintain_data_plane = maintain_data_plane;
        self
    }

    /// Sets pseudo-random fill of unconstrained cells.
    pub fn with_randomized_fill(mut self, randomized_fill: bool) -> Self {
        self.randomized_fill = randomized_fill;
        self
    }

    /// Fixes the RNG seed, making builds deterministic.
    pub fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = Some(rng_seed);
        self
    }

    /// Validates the configuration.
    ///
    /// The combined cell width (value bits + digest bits) must fit a single
    /// `u64` word or the bit-packed store cannot hold it.
    pub fn validate(&self) -> Result<()> {
        if self.value_bits == 0 || self.value_bits > 64 {
            return Err(OleloOthelloError::ConfigurationError(format!(
                "value_bits must be in 1..=64, got {}",
                self.value_bits
            )));
        }
        let cell_bits = u16::from(self.value_bits) + u16::from(self.digest_bits);
        if cell_bits > 64 {
            return Err(OleloOthelloError::ConfigurationError(format!(
                "value_bits + digest_bits must be <= 64, got {cell_bits}"
            )));
        }
        Ok(())
    }
}

impl Default for OleloOthelloConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 256,
            value_bits: 16, // destination indices are 16-bit in practice
            digest_bits: 0,
            maintain_data_plane: false,
            randomized_fill: false,
            rng_seed: None,
        }
    }
}
