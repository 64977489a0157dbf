// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Lookup engines for the Makai load-balancer core.
//!
//! Each engine lives in its own module with the same internal shape:
//! a mutable control plane owning full keys, a compact read-only data plane
//! exported as a snapshot, a builder-style config, and a `thiserror` error
//! enum. Instances are single-threaded by design; partition keys across
//! instances for parallelism.

pub mod manu_cuckoo;
pub mod olelo_othello;

// Re-export the engine entry points
pub use manu_cuckoo::{
    CuckooDataPlane, ManuCuckoo, ManuCuckooConfig, ManuCuckooError, TwoLevelCuckoo,
};
pub use olelo_othello::{
    OleloOthello, OleloOthelloConfig, OleloOthelloError, OthelloDataPlane, TwoLevelOthello,
};
