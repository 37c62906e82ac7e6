//! Built-in sample streams

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use riot_core::{DataSetMeasurement, StorageUnit, Stream, TimeRange, TypeSchema};
use riot_server::{DataSetEndPoint, DataSetProvider, DataSetWriter, DataSourceError};

const WATER_RETENTION: Duration = Duration::from_secs(120);

/// Upper bound on the rows one request can produce
const MAX_ROWS: usize = 100_000;
const BATCH_SIZE: usize = 128;

pub fn demo_streams() -> Vec<DataSetEndPoint> {
    let water = Stream::new("FFFFFFFF01000001", "Water Quality")
        .with_description("Simulated flow and fluoride readings, one per second")
        .with_retention(WATER_RETENTION)
        .with_field(TypeSchema::new("Water", StorageUnit::Number).with_unit("gpm"))
        .with_field(TypeSchema::new("Flouride", StorageUnit::Number).with_unit("ppm"));

    let empty = Stream::new("FFFFFFFF01000002", "Empty Stream")
        .with_description("This stream has no data");

    vec![
        DataSetEndPoint::new(water).with_data_source(Arc::new(SimulatedWaterSource {
            retention: WATER_RETENTION,
            interval: Duration::from_secs(1),
        })),
        DataSetEndPoint::new(empty),
    ]
}

/// Synthesizes readings on a fixed grid within the retention window
pub struct SimulatedWaterSource {
    retention: Duration,
    interval: Duration,
}

impl SimulatedWaterSource {
    fn readings(&self, range: TimeRange) -> Vec<DataSetMeasurement> {
        let now = Utc::now();
        let oldest = now - chrono::Duration::from_std(self.retention).unwrap_or(chrono::Duration::zero());
        let step = chrono::Duration::from_std(self.interval).unwrap_or(chrono::Duration::seconds(1));

        let start = range.start.map_or(oldest, |s| s.max(oldest));
        let end = range.end.map_or(now, |e| e.min(now));

        let mut readings = Vec::new();
        let mut time = start;
        while time <= end && readings.len() < MAX_ROWS {
            let tick = time.timestamp();
            readings.push(
                DataSetMeasurement::new(time)
                    .with_value("Water", format!("{:.1}", 1.0 + (tick % 10) as f64 / 10.0))
                    .with_value("Flouride", format!("{:.2}", 0.7 + (tick % 5) as f64 / 100.0)),
            );
            time += step;
        }
        readings
    }
}

#[async_trait]
impl DataSetProvider for SimulatedWaterSource {
    async fn read_range(
        &self,
        range: TimeRange,
        writer: &mut dyn DataSetWriter,
    ) -> Result<(), DataSourceError> {
        for batch in self.readings(range).chunks(BATCH_SIZE) {
            writer.write(batch).await?;
        }
        Ok(())
    }
}
