//! Client error types

use riot_hal::HalError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Error returned by a dataset reader; ends the read immediately
pub type ReaderError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] HalError),

    #[error("Stream {0} is not published by this server")]
    NotFound(String),

    #[error("Stream {0} does not link to a dataset")]
    MissingDatasetUrl(String),

    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Server returned {status} {title}: {detail}")]
    Server {
        status: u16,
        title: String,
        detail: String,
    },

    #[error("Dataset stream aborted: {0}")]
    StreamAborted(String),

    #[error("Dataset reader failed: {0}")]
    Reader(ReaderError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
