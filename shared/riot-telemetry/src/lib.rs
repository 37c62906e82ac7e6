//! rIOT Telemetry
//!
//! Structured logging for the stream server and its tools.

mod config;
mod tracing_setup;

pub use config::{LogTarget, TelemetryConfig};
pub use tracing_setup::init_tracing;

/// Initialize logging for a binary from the environment
pub fn init(service_name: &str) -> Result<(), TelemetryError> {
    let config = TelemetryConfig::from_env(service_name);
    init_tracing(&config)
}

/// Initialize logging for a command line tool whose results go to stdout
pub fn init_for_cli(service_name: &str) -> Result<(), TelemetryError> {
    let config = TelemetryConfig::from_env(service_name).with_log_target(LogTarget::Stderr);
    init_tracing(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}
