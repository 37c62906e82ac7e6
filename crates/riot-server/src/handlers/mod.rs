//! HTTP handlers for the stream server

pub mod discovery;
pub mod stream;

use std::convert::Infallible;

use axum::{
    extract::Request,
    http::{Method, Uri},
    response::Response,
    routing::MethodRouter,
};
use tower::ServiceExt;
use tracing::warn;

use crate::error::ApiError;

/// Only GET is served anywhere on the server
pub(crate) fn require_get(method: &Method, uri: &Uri) -> Result<(), ApiError> {
    if method == Method::GET {
        return Ok(());
    }

    warn!(method = %method, path = %uri.path(), "Request with invalid method received");
    Err(ApiError::MethodNotAllowed)
}

/// Pass the request on to a handler installed by the hosting process
pub(crate) async fn hand_off(handler: &MethodRouter, request: Request) -> Response {
    let result: Result<Response, Infallible> = handler.clone().oneshot(request).await;
    match result {
        Ok(response) => response,
        Err(never) => match never {},
    }
}
