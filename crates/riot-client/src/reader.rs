//! Consumers of dataset measurements

use async_trait::async_trait;
use riot_core::DataSetMeasurement;

use crate::error::ReaderError;

/// Receives the measurements of a dataset one at a time, in body order.
/// Returning an error stops the read.
#[async_trait]
pub trait DatasetReader: Send {
    async fn read(&mut self, measurement: DataSetMeasurement) -> Result<(), ReaderError>;
}

/// Reader calling a closure for every measurement
pub struct FnReader<F> {
    f: F,
}

pub fn from_fn<F>(f: F) -> FnReader<F>
where
    F: FnMut(DataSetMeasurement) -> Result<(), ReaderError> + Send,
{
    FnReader { f }
}

#[async_trait]
impl<F> DatasetReader for FnReader<F>
where
    F: FnMut(DataSetMeasurement) -> Result<(), ReaderError> + Send,
{
    async fn read(&mut self, measurement: DataSetMeasurement) -> Result<(), ReaderError> {
        (self.f)(measurement)
    }
}

/// Reader keeping every measurement
#[derive(Debug, Default)]
pub struct CollectingReader {
    pub measurements: Vec<DataSetMeasurement>,
}

#[async_trait]
impl DatasetReader for CollectingReader {
    async fn read(&mut self, measurement: DataSetMeasurement) -> Result<(), ReaderError> {
        self.measurements.push(measurement);
        Ok(())
    }
}
