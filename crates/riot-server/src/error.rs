//! Error types for the stream server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use riot_core::problem::{HTTP_STATUS_TYPE, RFC3339_TYPE};
use riot_core::{ModelError, ProblemDetails, PROBLEM_JSON};

use crate::response::json_response;

/// Failures reported to the client before any dataset byte is sent
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("The requested resource was not found. Check your URI and try again.")]
    NotFound,

    #[error("The requested http method is not allowed on this resource")]
    MethodNotAllowed,

    #[error("The expected type could not be fulfilled. Accept text/csv to read a dataset.")]
    UnacceptableRepresentation,

    #[error("The query parameters were invalid. start and end must be in RFC3339 Nano format.")]
    InvalidTimeFormat(#[source] ModelError),

    #[error("The query string could not be parsed: {0}")]
    InvalidQuery(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::UnacceptableRepresentation => StatusCode::EXPECTATION_FAILED,
            ApiError::InvalidTimeFormat(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn problem(&self) -> ProblemDetails {
        let status = self.status();
        let problem = ProblemDetails::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            self.to_string(),
        );

        match self {
            ApiError::NotFound => problem.with_type(HTTP_STATUS_TYPE),
            ApiError::InvalidTimeFormat(_) => problem.with_type(RFC3339_TYPE),
            _ => problem,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_response(self.status(), PROBLEM_JSON, &self.problem())
    }
}

/// Failures of the dataset writer handed to a data source
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("Client disconnected")]
    Cancelled,

    #[error("CSV encoding error: {0}")]
    Encode(#[from] csv::Error),
}

/// Failures of a data source while producing a range
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Data source error: {0}")]
    Source(String),
}

/// Failures changing the configured stream set
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Stream {0} is already attached")]
    DuplicateGuid(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}
