//! Makai Lookup Engines
//!
//! This library contains the lookup-structure core of a software load
//! balancer: compact, O(1) structures that map connection keys (5-tuples or
//! generalized keys) to destination servers. Each engine is split into a
//! mutable control plane (insert/remove/iterate) and an immutable,
//! read-optimized data plane exported as a snapshot.
//!
//! # Architecture
//!
//! Two independent engine families:
//! - `olelo_othello` — a two-array XOR construction; a query XORs two
//!   hash-derived cells to recover a value, with incremental maintenance of
//!   the underlying acyclic hash graph.
//! - `manu_cuckoo` — a 4-way candidate-bucket cuckoo map resolving
//!   collisions with a bounded breadth-first eviction search; its data plane
//!   stores per-slot digests instead of full keys.
//!
//! Instances are single-threaded; the intended deployment partitions keys
//! across per-worker instances and publishes data-plane snapshots by
//! pointer swap.

// Re-export public modules
pub mod data_structures;
pub mod error;
pub mod hashing;

/// Version information for the Makai lookup engines.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
