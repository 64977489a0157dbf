//! Error module for the Makai lookup engines.
//!
//! Expected, handleable conditions — a cuckoo table declaring itself full, an
//! Othello build exhausting its rehash budget — are returned as values, never
//! panics, so the orchestrator's control loop can react by rebuilding at a
//! larger capacity and replaying keys.

use thiserror::Error;

pub use crate::data_structures::manu_cuckoo::ManuCuckooError;
pub use crate::data_structures::olelo_othello::OleloOthelloError;

/// Result type alias used throughout the Makai lookup engines.
pub type MakaiResult<T> = Result<T, MakaiError>;

/// Core error enum for the Makai lookup engines.
#[derive(Error, Debug)]
pub enum MakaiError {
    /// Errors from the Othello engine (rebuild exhaustion, duplicates).
    #[error("Othello engine error: {0}")]
    Othello(#[from] OleloOthelloError),

    /// Errors from the cuckoo engine (capacity, duplicates).
    #[error("Cuckoo engine error: {0}")]
    Cuckoo(#[from] ManuCuckooError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: MakaiError = OleloOthelloError::RebuildExhausted { attempts: 50 }.into();
        assert!(matches!(err, MakaiError::Othello(_)));

        let err: MakaiError = ManuCuckooError::CapacityExhausted.into();
        assert!(err.to_string().contains("Cuckoo"));
    }
}
