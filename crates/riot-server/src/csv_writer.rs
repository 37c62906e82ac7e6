//! CSV dataset encoding
//!
//! A dataset body is a three line preamble (field names, measurement units,
//! storage tags) followed by one row per measurement. Row columns follow the
//! schema order with the timestamp last. Values whose name is not in the
//! schema are dropped; schema fields missing from a measurement are blank.

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use riot_core::{format_timestamp, DataSetMeasurement, StorageUnit, Stream, TypeSchema};
use tokio::sync::mpsc;

use crate::error::WriteError;
use crate::provider::DataSetWriter;

pub const TIME_COLUMN: &str = "Time";
pub const TIME_UNIT: &str = "nanosecond";

/// Body chunks handed to the HTTP layer. An `Err` aborts the exchange.
pub type ChunkSender = mpsc::Sender<Result<Bytes, io::Error>>;

/// The three preamble records for a stream
pub fn preamble(stream: &Stream) -> [Vec<String>; 3] {
    let mut names = Vec::with_capacity(stream.schema.len() + 1);
    let mut units = Vec::with_capacity(stream.schema.len() + 1);
    let mut storage = Vec::with_capacity(stream.schema.len() + 1);

    for field in &stream.schema {
        names.push(field.name.clone());
        units.push(field.measurement_unit.clone());
        storage.push(field.storage_unit.as_str().to_string());
    }

    names.push(TIME_COLUMN.to_string());
    units.push(TIME_UNIT.to_string());
    storage.push(StorageUnit::Time.as_str().to_string());

    [names, units, storage]
}

/// Project a measurement onto the schema order, timestamp last
pub fn project_row(schema: &[TypeSchema], measurement: &DataSetMeasurement) -> Vec<String> {
    let mut row: Vec<String> = schema
        .iter()
        .map(|field| measurement.value(&field.name).unwrap_or_default().to_string())
        .collect();
    row.push(format_timestamp(&measurement.time));
    row
}

/// Encode records as CSV text with `\n` terminators
pub fn encode_records<I, R>(records: I) -> Result<Vec<u8>, WriteError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for record in records {
        writer.write_record(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| WriteError::Encode(csv::Error::from(e.into_error())))
}

/// Writer pushing CSV chunks into a response body
pub struct CsvDatasetWriter {
    stream: Arc<Stream>,
    sender: ChunkSender,
    rows_written: u64,
}

impl CsvDatasetWriter {
    pub fn new(stream: Arc<Stream>, sender: ChunkSender) -> Self {
        Self {
            stream,
            sender,
            rows_written: 0,
        }
    }

    pub async fn write_preamble(&mut self) -> Result<(), WriteError> {
        let chunk = encode_records(preamble(&self.stream))?;
        self.flush(chunk).await
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// End the body with an error so the HTTP layer terminates the exchange
    /// abnormally. The client sees an unexpected connection close.
    pub async fn abort(self, reason: String) {
        // Nothing to do if the client is already gone
        let _ = self.sender.send(Err(io::Error::other(reason))).await;
    }

    async fn flush(&mut self, chunk: Vec<u8>) -> Result<(), WriteError> {
        if self.sender.is_closed() {
            return Err(WriteError::Cancelled);
        }
        self.sender
            .send(Ok(Bytes::from(chunk)))
            .await
            .map_err(|_| WriteError::Cancelled)
    }
}

#[async_trait]
impl DataSetWriter for CsvDatasetWriter {
    async fn write(&mut self, measurements: &[DataSetMeasurement]) -> Result<(), WriteError> {
        if self.is_cancelled() {
            return Err(WriteError::Cancelled);
        }
        if measurements.is_empty() {
            return Ok(());
        }

        let rows = measurements
            .iter()
            .map(|m| project_row(&self.stream.schema, m));
        let chunk = encode_records(rows)?;

        self.flush(chunk).await?;
        self.rows_written += measurements.len() as u64;
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.sender.is_closed()
    }
}
