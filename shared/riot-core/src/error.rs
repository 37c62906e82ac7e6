//! Error types for the stream model

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Duplicate schema field '{field}' in stream {stream}")]
    DuplicateField { stream: String, field: String },
}
