// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Configuration for the Manu Cuckoo engine.

use crate::data_structures::manu_cuckoo::error::{ManuCuckooError, Result};

/// Builder-style configuration for [`ManuCuckoo`](super::ManuCuckoo).
///
/// The table is presized: bucket count is fixed at construction (or
/// [`clear`](super::ManuCuckoo::clear)) from the expected entry count and
/// the 0.85 load factor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManuCuckooConfig {
    /// Expected number of entries the table is sized for.
    pub initial_capacity: u32,
    /// Fixed seed for the hash functions; fresh entropy when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for ManuCuckooConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            rng_seed: None,
        }
    }
}

impl ManuCuckooConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_capacity(mut self, initial_capacity: u32) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_rng_seed(mut self, rng_seed: u64) -> Self {
        self.rng_seed = Some(rng_seed);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(ManuCuckooError::ConfigurationError(
                "initial_capacity must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
}
