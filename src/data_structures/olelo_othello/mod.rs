// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Olelo Othello lookup engine.
//!
//! A minimal-space key/value map split into a mutable control plane and an
//! immutable data plane. The control plane ([`OleloOthello`]) stores full
//! keys and supports insert, remove, update and bulk remap; the data plane
//! ([`OthelloDataPlane`]) is a snapshot of two bit-packed cell arrays whose
//! XOR answers queries in two memory reads, with optional digest bits that
//! filter out most non-member keys.
//!
//! # Examples
//!
//! ```
//! use makai_lookup_lib::data_structures::olelo_othello::{
//!     OleloOthello, OleloOthelloConfig,
//! };
//!
//! let mut map = OleloOthello::with_config(
//!     OleloOthelloConfig::new().with_initial_capacity(256),
//! )?;
//! map.insert("connection-1", 7)?;
//! assert_eq!(map.get(&"connection-1"), Some(7));
//!
//! let snapshot = map.export_data_plane();
//! assert_eq!(snapshot.query(&"connection-1"), Some(7));
//! # Ok::<(), makai_lookup_lib::data_structures::olelo_othello::OleloOthelloError>(())
//! ```

mod bit_store;
mod config;
mod control_plane;
mod data_plane;
mod disjoint_set;
mod error;
mod graph;
mod two_level;

pub use config::OleloOthelloConfig;
pub use control_plane::{OleloOthello, MAX_REHASH};
pub use data_plane::OthelloDataPlane;
pub use error::OleloOthelloError;
pub use two_level::{TwoLevelOthello, TwoLevelOthelloDataPlane};
