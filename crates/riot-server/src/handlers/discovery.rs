//! Root resource: server identity and the index of streams

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use riot_core::wire::{RootDocument, REL_SELF, REL_STREAM};
use riot_hal::{create_link, Collection, Link};

use super::{hand_off, require_get};
use crate::context::ServerContext;
use crate::error::ApiError;
use crate::response::HalJson;

pub async fn root(State(ctx): State<Arc<ServerContext>>, request: Request) -> Response {
    if let Some(handler) = ctx.root_handler() {
        return hand_off(handler, request).await;
    }

    match require_get(request.method(), request.uri()) {
        Ok(()) => HalJson(root_document(&ctx)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Anything that is not the root or a stream resource
pub async fn fallback(State(ctx): State<Arc<ServerContext>>, request: Request) -> Response {
    unclaimed(&ctx, request).await
}

/// Paths no stream claims belong to the root handler when one is installed
pub(crate) async fn unclaimed(ctx: &ServerContext, request: Request) -> Response {
    if let Some(handler) = ctx.root_handler() {
        return hand_off(handler, request).await;
    }

    match require_get(request.method(), request.uri()) {
        Ok(()) => ApiError::NotFound,
        Err(e) => e,
    }
    .into_response()
}

/// Project the streams configured right now into the root document
pub fn root_document(ctx: &ServerContext) -> RootDocument {
    let identity = ctx.identity();
    let mut links = Collection::new().with(REL_SELF, create_link(ctx.path_prefix()));

    let streams = ctx.streams().snapshot();
    links.insert(
        REL_STREAM,
        streams
            .iter()
            .map(|endpoint| {
                let stream = &endpoint.stream;
                let link = Link::new(ctx.stream_path(&stream.guid)).with_guid(stream.guid.clone());
                if stream.name.is_empty() {
                    link
                } else {
                    link.with_name(stream.name.clone())
                }
            })
            .collect(),
    );

    RootDocument {
        name: identity.name.clone(),
        description: identity.description.clone(),
        guid: identity.guid.clone(),
        links,
    }
}
