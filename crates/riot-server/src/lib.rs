//! rIOT Stream Server
//!
//! HTTP handlers implementing stream discovery and data access:
//! - Root resource with server identity and a hypermedia index of streams
//! - Per-stream metadata resource
//! - CSV dataset resource streamed incrementally from a data source
//!
//! Streams live in a [`StreamRegistry`] that the hosting process may change
//! while the server is running.

pub mod context;
pub mod csv_writer;
pub mod error;
pub mod handlers;
pub mod provider;
pub mod registry;
pub mod response;
pub mod routes;

pub use context::{ErrorSink, ServerContext, ServerIdentity};
pub use error::{ApiError, DataSourceError, RegistryError, WriteError};
pub use provider::{DataSetProvider, DataSetWriter, InMemoryDataSet};
pub use registry::{DataSetEndPoint, StreamRegistry};
pub use routes::create_router;
