//! Telemetry Configuration

/// Where log lines are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Services log to stdout
    #[default]
    Stdout,
    /// Tools that print their results on stdout log to stderr
    Stderr,
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
    pub log_target: LogTarget,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "riot-service".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            log_target: LogTarget::Stdout,
        }
    }
}

impl TelemetryConfig {
    /// `SERVICE_NAME` overrides the given default name
    pub fn from_env(default_service_name: &str) -> Self {
        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| default_service_name.to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: std::env::var("JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            log_target: LogTarget::Stdout,
        }
    }

    pub fn with_log_target(mut self, target: LogTarget) -> Self {
        self.log_target = target;
        self
    }
}
