use thiserror::Error;

use crate::model::RoadId;

/// Convenient result alias for the roadnet library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Lookup misses and unroutable pairs are not errors; those surface as
/// `Option`/`bool`/not-found results. This enum covers the persistence
/// boundary only.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a road record fails validation during a bulk load.
    #[error("invalid road {id}: {reason}")]
    InvalidRoad { id: RoadId, reason: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
