//! Error types for geodex

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeodexError {
    // Lookup errors
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("unknown field: {field}")]
    InvalidField { field: String },

    // Coordinate errors
    #[error("invalid coordinate ({lat}, {lng}): latitude must be in [-90, 90], longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("no valid coordinate for key: {key}")]
    MissingCoordinate { key: String },

    // Iteration errors
    #[error("store was modified during iteration (observed generation {observed}, current {current})")]
    ConcurrentModification { observed: u64, current: u64 },
}

pub type Result<T> = std::result::Result<T, GeodexError>;
