//! Router configuration for the stream server

use std::sync::Arc;

use axum::{routing::any, Router};

use crate::context::ServerContext;
use crate::handlers::{discovery, stream};

/// Build the router for a server context.
///
/// Every route accepts any method so that method and path rejections are
/// answered with problem details rather than axum's bare defaults.
pub fn create_router(ctx: Arc<ServerContext>) -> Router {
    let prefix = ctx.path_prefix().to_string();

    Router::new()
        .route(&prefix, any(discovery::root))
        .route(&format!("{prefix}{{guid}}/"), any(stream::metadata))
        .route(&format!("{prefix}{{guid}}/dataset"), any(stream::dataset))
        .fallback(discovery::fallback)
        .with_state(ctx)
}
