//! Data sources and the writer they push measurements through

use async_trait::async_trait;
use parking_lot::RwLock;
use riot_core::{DataSetMeasurement, TimeRange};

use crate::error::{DataSourceError, WriteError};

/// Sink for the measurements of one dataset request.
///
/// Every call to `write` is flushed to the client as one chunk. An error
/// means the request is over and the data source should return it.
#[async_trait]
pub trait DataSetWriter: Send {
    async fn write(&mut self, measurements: &[DataSetMeasurement]) -> Result<(), WriteError>;

    /// Whether the client has gone away. Sources waiting on new data should poll this.
    fn is_cancelled(&self) -> bool;
}

/// Supplies the measurements of a stream for a time range
#[async_trait]
pub trait DataSetProvider: Send + Sync {
    async fn read_range(
        &self,
        range: TimeRange,
        writer: &mut dyn DataSetWriter,
    ) -> Result<(), DataSourceError>;
}

/// Measurements held in memory, served in batches
pub struct InMemoryDataSet {
    measurements: RwLock<Vec<DataSetMeasurement>>,
    batch_size: usize,
}

impl InMemoryDataSet {
    pub fn new(measurements: Vec<DataSetMeasurement>) -> Self {
        Self {
            measurements: RwLock::new(measurements),
            batch_size: 256,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn push(&self, measurement: DataSetMeasurement) {
        self.measurements.write().push(measurement);
    }

    pub fn len(&self) -> usize {
        self.measurements.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DataSetProvider for InMemoryDataSet {
    async fn read_range(
        &self,
        range: TimeRange,
        writer: &mut dyn DataSetWriter,
    ) -> Result<(), DataSourceError> {
        let selected: Vec<DataSetMeasurement> = self
            .measurements
            .read()
            .iter()
            .filter(|m| range.contains(&m.time))
            .cloned()
            .collect();

        for batch in selected.chunks(self.batch_size) {
            writer.write(batch).await?;
        }

        Ok(())
    }
}
