//! Stream resources: metadata and the CSV dataset

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use riot_core::wire::{StreamDocument, REL_DATA, REL_SELF};
use riot_core::{parse_timestamp, TimeRange, TEXT_CSV};
use riot_hal::{create_link, Collection};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use super::discovery::unclaimed;
use super::{hand_off, require_get};
use crate::context::ServerContext;
use crate::csv_writer::CsvDatasetWriter;
use crate::error::{ApiError, DataSourceError, WriteError};
use crate::registry::DataSetEndPoint;
use crate::response::HalJson;

/// Chunks buffered between the data source and the socket
const DATASET_CHANNEL_DEPTH: usize = 16;

const ACCEPTABLE_TYPES: [&str; 3] = [TEXT_CSV, "text/*", "*/*"];

pub async fn metadata(
    State(ctx): State<Arc<ServerContext>>,
    Path(guid): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let Some(endpoint) = ctx.streams().get(&guid) else {
        return Ok(unclaimed(&ctx, request).await);
    };
    if let Some(handler) = &endpoint.handler {
        return Ok(hand_off(handler, request).await);
    }
    require_get(request.method(), request.uri())?;

    let links = Collection::new()
        .with(REL_SELF, create_link(ctx.stream_path(&guid)))
        .with(REL_DATA, create_link(ctx.dataset_path(&guid)));

    Ok(HalJson(StreamDocument::describe(&endpoint.stream, links)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct DatasetQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DatasetQuery {
    /// Absent or empty bounds leave that side open
    pub fn into_range(self) -> Result<TimeRange, ApiError> {
        let parse = |value: Option<String>| match value.as_deref() {
            None | Some("") => Ok(None),
            Some(text) => parse_timestamp(text).map(Some).map_err(ApiError::InvalidTimeFormat),
        };

        Ok(TimeRange {
            start: parse(self.start)?,
            end: parse(self.end)?,
        })
    }
}

pub fn accepts_csv(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|accept| ACCEPTABLE_TYPES.iter().any(|t| accept.contains(t)))
}

pub async fn dataset(
    State(ctx): State<Arc<ServerContext>>,
    Path(guid): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let Some(endpoint) = ctx.streams().get(&guid) else {
        return Ok(unclaimed(&ctx, request).await);
    };
    if let Some(handler) = &endpoint.handler {
        return Ok(hand_off(handler, request).await);
    }
    require_get(request.method(), request.uri())?;

    if !accepts_csv(request.headers()) {
        return Err(ApiError::UnacceptableRepresentation);
    }

    let Query(query) = Query::<DatasetQuery>::try_from_uri(request.uri())
        .map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let range = query.into_range()?;

    // Everything past this point reaches the client as CSV or not at all
    let (sender, receiver) = mpsc::channel(DATASET_CHANNEL_DEPTH);
    let writer = CsvDatasetWriter::new(endpoint.stream.clone(), sender);
    tokio::spawn(stream_dataset(ctx, endpoint, range, writer));

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CSV))],
        Body::from_stream(ReceiverStream::new(receiver)),
    )
        .into_response())
}

/// Drive the data source for one request. Runs detached from the handler so
/// the response can start while measurements are still being produced.
async fn stream_dataset(
    ctx: Arc<ServerContext>,
    endpoint: Arc<DataSetEndPoint>,
    range: TimeRange,
    mut writer: CsvDatasetWriter,
) {
    let guid = endpoint.guid().to_string();

    if let Err(err) = writer.write_preamble().await {
        report_preamble_failure(&ctx, &guid, &err);
        if !matches!(err, WriteError::Cancelled) {
            writer.abort(err.to_string()).await;
        }
        return;
    }

    let Some(source) = endpoint.data_source.clone() else {
        debug!(guid = %guid, "Stream has no data source, served preamble only");
        return;
    };

    match source.read_range(range, &mut writer).await {
        Ok(()) => {
            debug!(guid = %guid, rows = writer.rows_written(), "Dataset served");
        }
        Err(DataSourceError::Write(WriteError::Cancelled)) => {
            info!(guid = %guid, rows = writer.rows_written(), "Client disconnected, dataset stopped");
        }
        Err(err) => {
            // CSV has no error channel once bytes are out; the exchange is cut instead
            ctx.log_error(&format!(
                "Stream Server : dataset for {} aborted after {} rows : {}",
                guid,
                writer.rows_written(),
                err
            ));
            writer.abort(err.to_string()).await;
        }
    }
}

fn report_preamble_failure(ctx: &ServerContext, guid: &str, err: &WriteError) {
    match err {
        WriteError::Cancelled => {
            debug!(guid = %guid, "Client left before the preamble was sent");
        }
        WriteError::Encode(_) => {
            ctx.log_error(&format!(
                "Stream Server : preamble for {guid} could not be written : {err}"
            ));
        }
    }
}
