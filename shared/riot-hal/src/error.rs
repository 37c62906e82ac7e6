//! HAL Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HalError>;

#[derive(Debug, Error)]
pub enum HalError {
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid collection shape for relation '{relation}': expected object, array or null")]
    InvalidCollectionShape { relation: String },
}
