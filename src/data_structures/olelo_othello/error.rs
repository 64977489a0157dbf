// Copyright (c) 2025 Makai Lookup Authors
//
// Licensed under the MIT License (LICENSE or https://opensource.org/licenses/MIT)

//! Error types for the Olelo Othello map.

/// Error types for Olelo Othello operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OleloOthelloError {
    /// The acyclic hash-graph build failed for every tried seed pair.
    ///
    /// The structure is left in an unusable state; the orchestrator must
    /// rebuild at a larger capacity and replay all live keys.
    #[error("othello build failed after {attempts} rehash attempts")]
    RebuildExhausted { attempts: u32 },

    /// Insert of a key that is already present.
    #[error("key already present in the map")]
    DuplicateKey,

    /// A value wider than the configured number of value bits.
    #[error("value does not fit in {value_bits} bits")]
    ValueTooWide { value_bits: u8 },

    /// Resize request below the current number of live keys.
    #[error("requested capacity {requested} is below current key count {current}")]
    CapacityBelowSize { requested: u32, current: u32 },

    /// Configuration error.
    #[error("invalid configuration: {0}")]
    ConfigurationError(String),
}

/// Result type for Olelo Othello operations.
pub type Result<T> = std::result::Result<T, OleloOthelloError>;
