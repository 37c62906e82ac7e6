//! JSON response helpers

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use riot_hal::HAL_JSON;
use serde::Serialize;

/// Encode `body` with an explicit media type
pub fn json_response<T: Serialize>(status: StatusCode, content_type: &'static str, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(data) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(content_type))],
            data,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// A `200 OK` hypermedia document
pub struct HalJson<T>(pub T);

impl<T: Serialize> IntoResponse for HalJson<T> {
    fn into_response(self) -> Response {
        json_response(StatusCode::OK, HAL_JSON, &self.0)
    }
}
