//! JSON documents exchanged between server and client

use std::time::Duration;

use riot_hal::Collection;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Stream, StorageUnit, TypeSchema};

/// Relation linking a document to itself
pub const REL_SELF: &str = "self";
/// Relation listing the streams of a server
pub const REL_STREAM: &str = "stream";
/// Relation pointing at a stream's dataset
pub const REL_DATA: &str = "data";

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server root resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "GUID", alias = "guid", default)]
    pub guid: String,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: Collection,
}

/// One schema entry of a stream document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "storageUnit")]
    pub storage_unit: StorageUnit,
    #[serde(rename = "measurmentUnit", default, skip_serializing_if = "String::is_empty")]
    pub measurement_unit: String,
}

impl From<&TypeSchema> for SchemaField {
    fn from(field: &TypeSchema) -> Self {
        Self {
            name: field.name.clone(),
            storage_unit: field.storage_unit,
            measurement_unit: field.measurement_unit.clone(),
        }
    }
}

impl From<SchemaField> for TypeSchema {
    fn from(field: SchemaField) -> Self {
        Self {
            name: field.name,
            storage_unit: field.storage_unit,
            measurement_unit: field.measurement_unit,
        }
    }
}

/// Stream metadata resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamDocument {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub guid: String,
    /// Nanoseconds
    #[serde(rename = "retentionPolicy", default)]
    pub retention_policy: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: Vec<SchemaField>,
    #[serde(rename = "_links", default, deserialize_with = "null_as_default")]
    pub links: Collection,
}

impl StreamDocument {
    pub fn describe(stream: &Stream, links: Collection) -> Self {
        Self {
            name: stream.name.clone(),
            description: stream.description.clone(),
            guid: stream.guid.clone(),
            retention_policy: i64::try_from(stream.retention_policy.as_nanos()).unwrap_or(i64::MAX),
            schema: stream.schema.iter().map(SchemaField::from).collect(),
            links,
        }
    }

    /// Split into the stream model and its links. Negative retention reads as zero.
    pub fn into_parts(self) -> (Stream, Collection) {
        let stream = Stream {
            name: self.name,
            description: self.description,
            guid: self.guid,
            schema: self.schema.into_iter().map(TypeSchema::from).collect(),
            retention_policy: Duration::from_nanos(u64::try_from(self.retention_policy).unwrap_or(0)),
        };
        (stream, self.links)
    }
}
