//! Explicit per-server context handed to every handler

use std::fmt;
use std::sync::Arc;

use axum::routing::MethodRouter;

use crate::registry::StreamRegistry;

/// Out-of-band receiver for failures that cannot reach the client
pub type ErrorSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Identity published on the root resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerIdentity {
    pub name: String,
    pub description: String,
    pub guid: String,
}

impl ServerIdentity {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            guid: guid.into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

pub struct ServerContext {
    path_prefix: String,
    identity: ServerIdentity,
    streams: StreamRegistry,
    error_sink: Option<ErrorSink>,
    root_handler: Option<MethodRouter>,
}

impl ServerContext {
    pub fn new(identity: ServerIdentity) -> Self {
        Self {
            path_prefix: "/".to_string(),
            identity,
            streams: StreamRegistry::new(),
            error_sink: None,
            root_handler: None,
        }
    }

    /// Mount the server below `prefix`. A leading and trailing slash are added as needed.
    pub fn with_path_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = normalize_prefix(prefix);
        self
    }

    /// Share an existing registry, e.g. one the hosting process keeps changing
    pub fn with_streams(mut self, streams: StreamRegistry) -> Self {
        self.streams = streams;
        self
    }

    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Serve the root, and every path no stream claims, with `handler`
    /// instead of the discovery document
    pub fn with_root_handler(mut self, handler: MethodRouter) -> Self {
        self.root_handler = Some(handler);
        self
    }

    pub fn root_handler(&self) -> Option<&MethodRouter> {
        self.root_handler.as_ref()
    }

    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    /// Root resource path; always ends with a slash
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// GUIDs are opaque, so they are escaped into a single path segment
    pub fn stream_path(&self, guid: &str) -> String {
        format!("{}{}/", self.path_prefix, guid_segment(guid))
    }

    pub fn dataset_path(&self, guid: &str) -> String {
        format!("{}{}/dataset", self.path_prefix, guid_segment(guid))
    }

    /// Report a failure the client can no longer be told about
    pub fn log_error(&self, message: &str) {
        tracing::error!(server = %self.identity.guid, "{}", message);
        if let Some(sink) = &self.error_sink {
            sink(message);
        }
    }
}

impl fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerContext")
            .field("path_prefix", &self.path_prefix)
            .field("identity", &self.identity)
            .field("streams", &self.streams.len())
            .field("error_sink", &self.error_sink.is_some())
            .field("root_handler", &self.root_handler.is_some())
            .finish()
    }
}

/// Everything but unreserved characters is escaped
fn guid_segment(guid: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(guid)
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
