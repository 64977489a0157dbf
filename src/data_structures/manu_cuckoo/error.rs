// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Error types for the Manu Cuckoo engine.

/// Errors surfaced by [`ManuCuckoo`](super::ManuCuckoo) operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ManuCuckooError {
    /// No eviction path was found within the bounded BFS; the table is
    /// effectively full. Prior contents are left intact.
    #[error("cuckoo table full: no eviction path within the search bound")]
    CapacityExhausted,

    /// The key is already stored; the insert was rejected.
    #[error("key already present in cuckoo table")]
    DuplicateKey,

    /// Invalid configuration.
    #[error("cuckoo configuration error: {0}")]
    ConfigurationError(String),
}

/// Result alias for cuckoo operations.
pub type Result<T> = std::result::Result<T, ManuCuckooError>;
