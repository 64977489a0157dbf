// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Manu Cuckoo lookup engine.
//!
//! A presized cuckoo hash table split into a mutable control plane and a
//! digest-only data plane. The control plane ([`ManuCuckoo`]) stores full
//! keys across 4 candidate buckets of 5 slots each and resolves overflow
//! with a bounded breadth-first eviction search; the data plane
//! ([`CuckooDataPlane`]) keeps only a 16-bit digest and the value per slot.
//!
//! # Examples
//!
//! ```
//! use makai_lookup_lib::data_structures::manu_cuckoo::{ManuCuckoo, ManuCuckooConfig};
//!
//! let mut table: ManuCuckoo<&str, u32> = ManuCuckoo::with_config(
//!     ManuCuckooConfig::new().with_initial_capacity(1024),
//! )?;
//! table.insert("connection-1", 7)?;
//! assert_eq!(table.find(&"connection-1"), Some(7));
//!
//! let snapshot = table.export_data_plane();
//! assert_eq!(snapshot.find(&"connection-1"), Some(7));
//! # Ok::<(), makai_lookup_lib::data_structures::manu_cuckoo::ManuCuckooError>(())
//! ```

mod config;
mod control_plane;
mod data_plane;
mod error;
mod two_level;

pub use config::ManuCuckooConfig;
pub use control_plane::{
    DigestGuardedInsert, ManuCuckoo, CANDIDATE_BUCKETS, LOAD_FACTOR, MAX_BFS_PATH_LEN,
    SLOTS_PER_BUCKET,
};
pub use data_plane::CuckooDataPlane;
pub use error::ManuCuckooError;
pub use two_level::{TwoLevelCuckoo, TwoLevelCuckooDataPlane};
