//! Client side of the stream protocol
//!
//! A `RiotEndpoint` is a handle on one server. It reads the root document
//! once, resolves stream metadata lazily and keeps it for its lifetime, and
//! reads datasets as a stream of measurements.

use std::sync::Arc;

use dashmap::DashMap;
use futures_util::StreamExt;
use riot_core::wire::{RootDocument, StreamDocument, REL_DATA, REL_STREAM};
use riot_core::{
    format_timestamp, parse_timestamp, DataSetMeasurement, DataSetValue, ProblemDetails, Stream,
    TimeRange, TEXT_CSV,
};
use riot_hal::{Collection, HAL_JSON};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::csv_decoder::CsvRecordDecoder;
use crate::error::{ClientError, Result};
use crate::reader::DatasetReader;
use crate::transport::{HttpTransport, Transport, TransportRequest, TransportResponse};

/// Lines before the first row: names, measurement units, storage tags
const PREAMBLE_LINES: usize = 3;

#[derive(Debug, Clone)]
struct StreamEntry {
    href: String,
    dataset_url: Option<Url>,
    stream: Option<Arc<Stream>>,
}

pub struct RiotEndpoint {
    name: String,
    description: String,
    guid: String,
    url: Url,
    transport: Arc<dyn Transport>,
    streams: DashMap<String, StreamEntry>,
}

impl RiotEndpoint {
    /// Connect over HTTP and read the server's root document
    pub async fn initialize(server_url: &str) -> Result<Self> {
        Self::initialize_with(Arc::new(HttpTransport::new()), server_url).await
    }

    pub async fn initialize_with(transport: Arc<dyn Transport>, server_url: &str) -> Result<Self> {
        let url = Url::parse(server_url)?;
        let (root, links): (RootDocument, Collection) =
            fetch_document(transport.as_ref(), &url).await?;

        let streams = DashMap::new();
        for link in links.get(REL_STREAM) {
            let (Some(guid), Some(href)) = (link.guid.as_deref(), link.href()) else {
                warn!(server = %url, "Skipping stream link without guid or href");
                continue;
            };
            if guid.is_empty() || streams.contains_key(guid) {
                continue;
            }
            streams.insert(
                guid.to_string(),
                StreamEntry {
                    href: href.to_string(),
                    dataset_url: None,
                    stream: None,
                },
            );
        }

        info!(
            server = %url,
            guid = %root.guid,
            streams = streams.len(),
            "Connected to stream server"
        );

        Ok(Self {
            name: root.name,
            description: root.description,
            guid: root.guid,
            url,
            transport,
            streams,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GUIDs of the streams the server listed, in no particular order
    pub fn resource_list(&self) -> Vec<String> {
        self.streams.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Stream metadata, fetched on first use and cached afterwards
    pub async fn get_resource(&self, guid: &str) -> Result<Arc<Stream>> {
        let href = {
            let entry = self
                .streams
                .get(guid)
                .ok_or_else(|| ClientError::NotFound(guid.to_string()))?;
            if let Some(stream) = &entry.stream {
                return Ok(stream.clone());
            }
            entry.href.clone()
        };

        let stream_url = self.url.join(&href)?;
        let (document, links): (StreamDocument, Collection) =
            fetch_document(self.transport.as_ref(), &stream_url).await?;

        let (mut stream, _) = document.into_parts();
        if stream.guid.is_empty() {
            stream.guid = guid.to_string();
        }
        let dataset_url = links
            .first(REL_DATA)
            .and_then(|link| link.href())
            .map(|href| stream_url.join(href))
            .transpose()?;

        debug!(guid = %guid, fields = stream.schema.len(), "Resolved stream metadata");

        let mut entry = self
            .streams
            .get_mut(guid)
            .ok_or_else(|| ClientError::NotFound(guid.to_string()))?;
        // A concurrent resolution may have won the race; keep its copy
        if let Some(existing) = &entry.stream {
            return Ok(existing.clone());
        }
        let stream = Arc::new(stream);
        entry.stream = Some(stream.clone());
        entry.dataset_url = dataset_url;
        Ok(stream)
    }

    /// Read the measurements of a stream within `range`, handing each to `reader`
    pub async fn read_dataset(
        &self,
        guid: &str,
        reader: &mut dyn DatasetReader,
        range: TimeRange,
    ) -> Result<()> {
        self.get_resource(guid).await?;

        let dataset_url = self
            .streams
            .get(guid)
            .and_then(|entry| entry.dataset_url.clone())
            .ok_or_else(|| ClientError::MissingDatasetUrl(guid.to_string()))?;
        let url = dataset_request_url(dataset_url, &range);

        let response = fetch(self.transport.as_ref(), &url, TEXT_CSV).await?;
        let mut body = response.body;
        let mut decoder = CsvRecordDecoder::new();
        let mut rows = RowAssembler::default();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| ClientError::StreamAborted(e.to_string()))?;
            for record in decoder.feed(&chunk)? {
                rows.accept(record, reader).await?;
            }
        }
        for record in decoder.finish()? {
            rows.accept(record, reader).await?;
        }

        rows.finish()?;
        debug!(guid = %guid, rows = rows.delivered, "Dataset read");
        Ok(())
    }
}

/// Turns decoded records into measurements once the preamble is past
#[derive(Default)]
struct RowAssembler {
    names: Vec<String>,
    preamble_seen: usize,
    delivered: u64,
}

impl RowAssembler {
    async fn accept(&mut self, record: Vec<String>, reader: &mut dyn DatasetReader) -> Result<()> {
        if self.preamble_seen < PREAMBLE_LINES {
            if self.preamble_seen == 0 {
                self.names = record;
            }
            self.preamble_seen += 1;
            return Ok(());
        }

        if record.len() != self.names.len() {
            return Err(ClientError::Decode(format!(
                "row has {} columns, preamble has {}",
                record.len(),
                self.names.len()
            )));
        }

        let measurement = self.measurement(record)?;
        reader.read(measurement).await.map_err(ClientError::Reader)?;
        self.delivered += 1;
        Ok(())
    }

    fn measurement(&self, mut record: Vec<String>) -> Result<DataSetMeasurement> {
        let time = record
            .pop()
            .ok_or_else(|| ClientError::Decode("empty dataset row".to_string()))?;
        let time = parse_timestamp(&time).map_err(|e| ClientError::InvalidTimeFormat(e.to_string()))?;

        let values = self
            .names
            .iter()
            .zip(record)
            .map(|(name, value)| DataSetValue::new(name.clone(), value))
            .collect();

        Ok(DataSetMeasurement { time, values })
    }

    fn finish(&self) -> Result<()> {
        if self.preamble_seen < PREAMBLE_LINES {
            return Err(ClientError::Decode(format!(
                "dataset ended after {} of {} preamble lines",
                self.preamble_seen, PREAMBLE_LINES
            )));
        }
        Ok(())
    }
}

/// Dataset URL with `start` and `end` set for the bounded sides of the range
fn dataset_request_url(mut url: Url, range: &TimeRange) -> Url {
    let bounds = [("start", range.start), ("end", range.end)];
    if bounds.iter().any(|(_, bound)| bound.is_some()) {
        let mut query = url.query_pairs_mut();
        for (key, bound) in bounds {
            if let Some(time) = bound {
                query.append_pair(key, &format_timestamp(&time));
            }
        }
    }
    url
}

async fn fetch(transport: &dyn Transport, url: &Url, accept: &'static str) -> Result<TransportResponse> {
    let response = transport
        .get(TransportRequest {
            url: url.clone(),
            accept,
        })
        .await?;

    if !response.is_success() {
        return Err(server_error(response).await);
    }
    Ok(response)
}

async fn fetch_document<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &Url,
) -> Result<(T, Collection)> {
    let body = fetch(transport, url, HAL_JSON).await?.bytes().await?;
    decode_document(&body)
}

/// Split a hypermedia document into its fields and its `_links`. A badly
/// shaped `_links` is a protocol violation rather than a decode error.
fn decode_document<T: DeserializeOwned>(body: &[u8]) -> Result<(T, Collection)> {
    let mut raw: Map<String, Value> = serde_json::from_slice(body)?;
    let links = match raw.remove("_links") {
        Some(value) => Collection::from_value(value)?,
        None => Collection::new(),
    };
    let document = serde_json::from_value(Value::Object(raw))?;
    Ok((document, links))
}

async fn server_error(response: TransportResponse) -> ClientError {
    let status = response.status;
    let body = response.bytes().await.unwrap_or_default();

    match serde_json::from_slice::<ProblemDetails>(&body) {
        Ok(problem) => ClientError::Server {
            status,
            title: problem.title,
            detail: problem.detail,
        },
        Err(_) => ClientError::Server {
            status,
            title: format!("HTTP {status}"),
            detail: String::from_utf8_lossy(&body).into_owned(),
        },
    }
}
