//! rIOT Stream Server
//!
//! Publishes telemetry streams over HTTP:
//! - Discovery document listing every stream
//! - Stream metadata documents
//! - CSV datasets streamed as they are read

mod config;
mod demo;

use std::sync::Arc;

use riot_server::{create_router, ServerContext, ServerIdentity};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

pub use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    riot_telemetry::init("stream-server")?;

    info!("Starting rIOT stream server");

    let config = ServerConfig::from_env()?;
    let bind_addr = config.bind_address();

    let identity = ServerIdentity::new(&config.server_guid, &config.server_name)
        .with_description(&config.server_description);
    let ctx = ServerContext::new(identity).with_path_prefix(&config.path_prefix);

    if config.demo_streams {
        for endpoint in demo::demo_streams() {
            ctx.streams().attach(endpoint)?;
        }
    }

    // Dataset bodies are still streaming when the response is logged
    let app = create_router(Arc::new(ctx)).layer(
        TraceLayer::new_for_http().on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        guid = %config.server_guid,
        prefix = %config.path_prefix,
        "Stream server listening on {}",
        bind_addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stream server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
