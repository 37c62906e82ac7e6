//! rIOT Client
//!
//! Discovers the streams of a server, resolves their metadata and reads
//! datasets as a stream of measurements.

pub mod csv_decoder;
pub mod endpoint;
pub mod error;
pub mod reader;
pub mod transport;

pub use csv_decoder::CsvRecordDecoder;
pub use endpoint::RiotEndpoint;
pub use error::{ClientError, ReaderError, Result};
pub use reader::{from_fn, CollectingReader, DatasetReader, FnReader};
pub use transport::{BodyStream, HttpTransport, Transport, TransportRequest, TransportResponse};
