//! Configuration for the stream server

/// Stream server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP bind address
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Path the root resource is mounted at
    pub path_prefix: String,
    pub server_name: String,
    pub server_description: String,
    /// Generated at startup when unset
    pub server_guid: String,
    /// Publish the built-in sample streams
    pub demo_streams: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "7468".to_string())
                .parse()?,
            path_prefix: std::env::var("RIOT_PATH_PREFIX").unwrap_or_else(|_| "/".to_string()),
            server_name: std::env::var("RIOT_SERVER_NAME")
                .unwrap_or_else(|_| "rIOT Stream Server".to_string()),
            server_description: std::env::var("RIOT_SERVER_DESCRIPTION").unwrap_or_default(),
            server_guid: std::env::var("RIOT_SERVER_GUID").unwrap_or_else(|_| generate_guid()),
            demo_streams: std::env::var("RIOT_DEMO_STREAMS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Random 64-bit identifier in upper-case hex
pub fn generate_guid() -> String {
    format!("{:016X}", rand::random::<u64>())
}
