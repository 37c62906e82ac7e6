//! Configured streams
//!
//! The stream list is a copy-on-write snapshot: attaching or detaching a
//! stream swaps in a new list, and every request works on the snapshot it
//! took when it started. The lock is never held across an await.

use std::sync::Arc;

use axum::routing::MethodRouter;
use parking_lot::RwLock;
use riot_core::Stream;
use tracing::info;

use crate::error::RegistryError;
use crate::provider::DataSetProvider;

/// A published stream and the source of its measurements
#[derive(Clone)]
pub struct DataSetEndPoint {
    pub stream: Arc<Stream>,
    /// Without a source the dataset resource serves the preamble only
    pub data_source: Option<Arc<dyn DataSetProvider>>,
    /// Takes over the metadata and dataset resources of this stream
    pub handler: Option<MethodRouter>,
}

impl DataSetEndPoint {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream: Arc::new(stream),
            data_source: None,
            handler: None,
        }
    }

    pub fn with_data_source(mut self, source: Arc<dyn DataSetProvider>) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn with_handler(mut self, handler: MethodRouter) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn guid(&self) -> &str {
        &self.stream.guid
    }
}

impl std::fmt::Debug for DataSetEndPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSetEndPoint")
            .field("stream", &self.stream)
            .field("data_source", &self.data_source.is_some())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

pub type StreamSnapshot = Arc<Vec<Arc<DataSetEndPoint>>>;

/// Shared, cheaply clonable handle to the configured streams
#[derive(Clone, Default)]
pub struct StreamRegistry {
    inner: Arc<RwLock<StreamSnapshot>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a stream. Its schema must be valid and its GUID unused.
    pub fn attach(&self, endpoint: DataSetEndPoint) -> Result<(), RegistryError> {
        endpoint.stream.validate()?;

        let mut current = self.inner.write();
        if current.iter().any(|e| e.guid() == endpoint.guid()) {
            return Err(RegistryError::DuplicateGuid(endpoint.guid().to_string()));
        }

        info!(guid = %endpoint.guid(), name = %endpoint.stream.name, "Stream attached");

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(Arc::new(endpoint));
        *current = Arc::new(next);

        Ok(())
    }

    /// Withdraw a stream. Requests already streaming it keep their snapshot.
    pub fn detach(&self, guid: &str) -> Option<Arc<DataSetEndPoint>> {
        let mut current = self.inner.write();
        let position = current.iter().position(|e| e.guid() == guid)?;

        let mut next: Vec<_> = current.iter().cloned().collect();
        let removed = next.remove(position);
        *current = Arc::new(next);

        info!(guid = %guid, "Stream detached");
        Some(removed)
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        self.inner.read().clone()
    }

    pub fn get(&self, guid: &str) -> Option<Arc<DataSetEndPoint>> {
        self.inner.read().iter().find(|e| e.guid() == guid).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
