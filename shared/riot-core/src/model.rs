//! Stream metadata and measurement types

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// How a value is stored. Purely descriptive; values always travel as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageUnit {
    Number,
    String,
    Boolean,
    #[serde(rename = "date")]
    Time,
}

impl StorageUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Time => "date",
        }
    }
}

impl fmt::Display for StorageUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema of a single value in a measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    /// Unique within the owning stream
    pub name: String,
    pub storage_unit: StorageUnit,
    /// Real world unit, empty when not declared
    pub measurement_unit: String,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>, storage_unit: StorageUnit) -> Self {
        Self {
            name: name.into(),
            storage_unit,
            measurement_unit: String::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.measurement_unit = unit.into();
        self
    }
}

/// A published data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub name: String,
    /// Human readable description of this stream
    pub description: String,
    /// Opaque identifier. A 64 bit value in hex is recommended but never checked.
    pub guid: String,
    /// Ordered schema; dataset columns follow this order
    pub schema: Vec<TypeSchema>,
    /// How long a measurement should be kept. Not enforced here.
    pub retention_policy: Duration,
}

impl Stream {
    pub fn new(guid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            guid: guid.into(),
            schema: Vec::new(),
            retention_policy: Duration::ZERO,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_field(mut self, field: TypeSchema) -> Self {
        self.schema.push(field);
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention_policy = retention;
        self
    }

    pub fn field(&self, name: &str) -> Option<&TypeSchema> {
        self.schema.iter().find(|f| f.name == name)
    }

    /// Check that schema field names are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.schema.len());
        for field in &self.schema {
            if !seen.insert(field.name.as_str()) {
                return Err(ModelError::DuplicateField {
                    stream: self.guid.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A single named value of a measurement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetValue {
    pub name: String,
    pub value: String,
}

impl DataSetValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single measurement in a data set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetMeasurement {
    pub time: DateTime<Utc>,
    pub values: Vec<DataSetValue>,
}

impl DataSetMeasurement {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push(DataSetValue::new(name, value));
        self
    }

    /// First value carrying the given name
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }
}

/// Requested time window. `None` leaves that side unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| *time >= start) && self.end.map_or(true, |end| *time <= end)
    }
}
