//! HTTP-level tests for the stream server router.
//!
//! Requests are driven straight through the router with `oneshot`; no socket
//! is involved.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use riot_core::{DataSetMeasurement, StorageUnit, Stream, TimeRange, TypeSchema};
use riot_server::{
    create_router, DataSetEndPoint, DataSetProvider, DataSetWriter, DataSourceError,
    InMemoryDataSet, ServerContext, ServerIdentity, WriteError,
};
use serde_json::Value;
use tokio::sync::oneshot;
use tower::ServiceExt;

// ── Fixtures ───────────────────────────────────────────────────

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 3, 1, 12, 0, 0).unwrap()
}

fn water_stream(guid: &str) -> Stream {
    Stream::new(guid, "Empty Test Stream 1")
        .with_description("Water quality readings")
        .with_retention(Duration::from_secs(120))
        .with_field(TypeSchema::new("Water", StorageUnit::Number).with_unit("gpm"))
        .with_field(TypeSchema::new("Flouride", StorageUnit::Number).with_unit("ppm"))
}

fn water_data() -> InMemoryDataSet {
    InMemoryDataSet::new(vec![
        DataSetMeasurement::new(t0())
            .with_value("Flouride", "1.2")
            .with_value("Water", "1.1"),
        DataSetMeasurement::new(t0() + chrono::Duration::seconds(1)).with_value("Water", "1.3"),
        DataSetMeasurement::new(t0() + chrono::Duration::seconds(2)).with_value("Flouride", "0.9"),
    ])
}

fn build_context(prefix: &str) -> Arc<ServerContext> {
    let ctx = ServerContext::new(
        ServerIdentity::new("FFFFFFFF00000001", "Empty Server")
            .with_description("This server has streams for clients to consume."),
    )
    .with_path_prefix(prefix);

    ctx.streams()
        .attach(
            DataSetEndPoint::new(water_stream("FFFFFFFF01000001"))
                .with_data_source(Arc::new(water_data())),
        )
        .unwrap();
    ctx.streams()
        .attach(DataSetEndPoint::new(Stream::new("FFFFFFFF01000002", "Empty Test Stream 2")))
        .unwrap();

    Arc::new(ctx)
}

async fn send(app: &Router, method: &str, uri: &str, accept: Option<&str>) -> Response {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(accept) = accept {
        request = request.header(header::ACCEPT, accept);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    resp.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

fn content_type(resp: &Response) -> &str {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ── Discovery ───────────────────────────────────────────────────

#[tokio::test]
async fn test_root_lists_streams() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "GET", "/", None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/hal+json");

    let body = body_json(resp).await;
    assert_eq!(body["name"], "Empty Server");
    assert_eq!(body["GUID"], "FFFFFFFF00000001");
    assert_eq!(body["_links"]["self"]["href"], "/");

    let streams = body["_links"]["stream"].as_array().unwrap();
    assert_eq!(streams.len(), 2);
    assert_eq!(streams[0]["href"], "/FFFFFFFF01000001/");
    assert_eq!(streams[0]["guid"], "FFFFFFFF01000001");
    assert_eq!(streams[1]["name"], "Empty Test Stream 2");
}

#[tokio::test]
async fn test_root_rejects_other_methods() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "POST", "/", None).await;

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(content_type(&resp), "application/problem+json");
    let body = body_json(resp).await;
    assert_eq!(body["status"], 405);
    assert_eq!(body["title"], "Method Not Allowed");
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let app = create_router(build_context("/riot/"));

    for path in ["/", "/riot", "/riot/missing", "/riot/UNKNOWN/", "/riot/UNKNOWN/dataset"] {
        let resp = send(&app, "GET", path, Some("text/csv")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "path {path}");
        let body = body_json(resp).await;
        assert_eq!(body["status"], 404);
        assert_eq!(
            body["type"],
            "http://www.w3.org/Protocols/rfc2616/rfc2616-sec10.html"
        );
    }

    let resp = send(&app, "DELETE", "/riot/missing", None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_prefixed_root_and_links() {
    let app = create_router(build_context("/riot"));
    let body = body_json(send(&app, "GET", "/riot/", None).await).await;

    assert_eq!(body["_links"]["self"]["href"], "/riot/");
    assert_eq!(body["_links"]["stream"][0]["href"], "/riot/FFFFFFFF01000001/");
}

#[tokio::test]
async fn test_hot_attached_stream_is_listed_next_request() {
    let ctx = build_context("/");
    let app = create_router(ctx.clone());

    ctx.streams()
        .attach(DataSetEndPoint::new(Stream::new("FFFFFFFF01000003", "Late Stream")))
        .unwrap();
    let body = body_json(send(&app, "GET", "/", None).await).await;
    assert_eq!(body["_links"]["stream"].as_array().unwrap().len(), 3);

    let resp = send(&app, "GET", "/FFFFFFFF01000003/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    ctx.streams().detach("FFFFFFFF01000001");
    ctx.streams().detach("FFFFFFFF01000002");
    let body = body_json(send(&app, "GET", "/", None).await).await;
    // A single remaining stream collapses to a bare object
    assert_eq!(body["_links"]["stream"]["guid"], "FFFFFFFF01000003");

    let resp = send(&app, "GET", "/FFFFFFFF01000001/", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_opaque_guids_are_reachable_through_their_links() {
    let ctx = ServerContext::new(ServerIdentity::new("S", "Server"));
    let guids = ["a/b", "what?now", "tag#1", "with space", "100%"];
    for guid in guids {
        ctx.streams()
            .attach(
                DataSetEndPoint::new(water_stream(guid)).with_data_source(Arc::new(water_data())),
            )
            .unwrap();
    }
    let app = create_router(Arc::new(ctx));

    let root = body_json(send(&app, "GET", "/", None).await).await;
    let links = root["_links"]["stream"].as_array().unwrap().clone();
    assert_eq!(links.len(), guids.len());

    for (link, guid) in links.iter().zip(guids) {
        assert_eq!(link["guid"], guid);
        let href = link["href"].as_str().unwrap();
        assert!(!href.trim_end_matches('/')[1..].contains(&['/', '?', '#', ' '][..]), "{href}");

        let resp = send(&app, "GET", href, None).await;
        assert_eq!(resp.status(), StatusCode::OK, "guid {guid} at {href}");
        let meta = body_json(resp).await;
        assert_eq!(meta["guid"], guid);
        assert_eq!(meta["_links"]["self"]["href"], href);

        let data_href = meta["_links"]["data"]["href"].as_str().unwrap().to_string();
        let resp = send(&app, "GET", &data_href, Some("text/csv")).await;
        assert_eq!(resp.status(), StatusCode::OK, "guid {guid} at {data_href}");
        let text = String::from_utf8(body_bytes(resp).await).unwrap();
        assert_eq!(text.lines().count(), 6);
    }
}

#[tokio::test]
async fn test_root_handler_replaces_discovery() {
    let ctx = ServerContext::new(ServerIdentity::new("S", "Server"))
        .with_path_prefix("/riot")
        .with_root_handler(get(|| async { (StatusCode::IM_A_TEAPOT, "custom root") }));
    ctx.streams()
        .attach(DataSetEndPoint::new(water_stream("G1")).with_data_source(Arc::new(water_data())))
        .unwrap();
    let app = create_router(Arc::new(ctx));

    for path in ["/riot/", "/riot/missing", "/riot/UNKNOWN/", "/riot/UNKNOWN/dataset"] {
        let resp = send(&app, "GET", path, None).await;
        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT, "path {path}");
        assert_eq!(body_bytes(resp).await, b"custom root");
    }

    // Streams are still served by the protocol handlers
    let resp = send(&app, "GET", "/riot/G1/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["guid"], "G1");
}

#[tokio::test]
async fn test_stream_handler_takes_over_its_resources() {
    let ctx = build_context("/");
    let app = create_router(ctx.clone());

    let custom = get(|request: Request<Body>| async move {
        format!("custom {}", request.uri().path()).into_response()
    });
    ctx.streams()
        .attach(DataSetEndPoint::new(Stream::new("FFFFFFFF01000003", "Custom")).with_handler(custom))
        .unwrap();

    let resp = send(&app, "GET", "/FFFFFFFF01000003/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"custom /FFFFFFFF01000003/");

    let resp = send(&app, "GET", "/FFFFFFFF01000003/dataset", Some("application/xml")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, b"custom /FFFFFFFF01000003/dataset");

    // The installed router decides which methods it serves
    let resp = send(&app, "POST", "/FFFFFFFF01000003/", None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

    // Other streams keep the protocol handlers
    let resp = send(&app, "GET", "/FFFFFFFF01000001/", None).await;
    assert_eq!(content_type(&resp), "application/hal+json");
}

// ── Stream metadata ─────────────────────────────────────────────

#[tokio::test]
async fn test_stream_metadata() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "GET", "/FFFFFFFF01000001/", None).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/hal+json");

    let body = body_json(resp).await;
    assert_eq!(body["guid"], "FFFFFFFF01000001");
    assert_eq!(body["description"], "Water quality readings");
    assert_eq!(body["retentionPolicy"], 120_000_000_000i64);
    assert_eq!(body["schema"][0]["name"], "Water");
    assert_eq!(body["schema"][0]["storageUnit"], "number");
    assert_eq!(body["schema"][0]["measurmentUnit"], "gpm");
    assert_eq!(body["_links"]["self"]["href"], "/FFFFFFFF01000001/");
    assert_eq!(body["_links"]["data"]["href"], "/FFFFFFFF01000001/dataset");
}

#[tokio::test]
async fn test_stream_metadata_rejects_other_methods() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "PUT", "/FFFFFFFF01000001/", None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Dataset ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_dataset_streams_csv_in_schema_order() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "GET", "/FFFFFFFF01000001/dataset", Some("text/csv")).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "text/csv");

    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    assert_eq!(
        text,
        "Water,Flouride,Time\n\
         gpm,ppm,nanosecond\n\
         number,number,date\n\
         1.1,1.2,2018-03-01T12:00:00Z\n\
         1.3,,2018-03-01T12:00:01Z\n\
         ,0.9,2018-03-01T12:00:02Z\n"
    );
}

#[tokio::test]
async fn test_dataset_honors_range() {
    let app = create_router(build_context("/"));
    let uri = "/FFFFFFFF01000001/dataset?start=2018-03-01T12:00:00.5Z&end=2018-03-01T12:00:01Z";
    let resp = send(&app, "GET", uri, Some("*/*")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    let rows: Vec<_> = text.lines().skip(3).collect();
    assert_eq!(rows, vec!["1.3,,2018-03-01T12:00:01Z"]);
}

#[tokio::test]
async fn test_dataset_without_source_serves_preamble_only() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "GET", "/FFFFFFFF01000002/dataset", Some("text/csv")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    assert_eq!(text, "Time\nnanosecond\ndate\n");
}

#[tokio::test]
async fn test_dataset_requires_csv_accept() {
    let app = create_router(build_context("/"));
    let resp = send(&app, "GET", "/FFFFFFFF01000001/dataset", Some("application/xml")).await;

    assert_eq!(resp.status(), StatusCode::EXPECTATION_FAILED);
    assert_eq!(content_type(&resp), "application/problem+json");
    let body = body_json(resp).await;
    assert_eq!(body["status"], 417);

    let resp = send(&app, "GET", "/FFFFFFFF01000001/dataset", None).await;
    assert_eq!(resp.status(), StatusCode::EXPECTATION_FAILED);
}

#[tokio::test]
async fn test_dataset_rejects_malformed_start() {
    let app = create_router(build_context("/"));
    let uri = "/FFFFFFFF01000001/dataset?start=03%2F01%2F2018";
    let resp = send(&app, "GET", uri, Some("text/csv")).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&resp), "application/problem+json");
    let text = String::from_utf8(body_bytes(resp).await).unwrap();
    assert!(!text.contains("Water,Flouride,Time"));

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["type"], "https://www.ietf.org/rfc/rfc3339.txt");
}

// ── Streaming failures ──────────────────────────────────────────

/// Writes one batch, then fails
struct FailingSource;

#[async_trait]
impl DataSetProvider for FailingSource {
    async fn read_range(
        &self,
        _range: TimeRange,
        writer: &mut dyn DataSetWriter,
    ) -> Result<(), DataSourceError> {
        writer
            .write(&[DataSetMeasurement::new(t0()).with_value("Water", "1.0")])
            .await?;
        Err(DataSourceError::Source("sensor offline".to_string()))
    }
}

#[tokio::test]
async fn test_source_failure_after_first_byte_aborts_body() {
    let logged = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink_log = logged.clone();

    let ctx = ServerContext::new(ServerIdentity::new("S", "Server"))
        .with_error_sink(Arc::new(move |msg: &str| sink_log.lock().push(msg.to_string())));
    ctx.streams()
        .attach(DataSetEndPoint::new(water_stream("G1")).with_data_source(Arc::new(FailingSource)))
        .unwrap();
    let app = create_router(Arc::new(ctx));

    let resp = send(&app, "GET", "/G1/dataset", Some("text/csv")).await;
    // Headers already went out as a success
    assert_eq!(resp.status(), StatusCode::OK);

    let result = resp.into_body().collect().await;
    assert!(result.is_err());

    let logged = logged.lock();
    assert_eq!(logged.len(), 1);
    assert!(logged[0].contains("G1"));
    assert!(logged[0].contains("sensor offline"));
}

/// Writes until the writer refuses, then reports what stopped it
struct EndlessSource {
    outcome: Mutex<Option<oneshot::Sender<bool>>>,
}

#[async_trait]
impl DataSetProvider for EndlessSource {
    async fn read_range(
        &self,
        _range: TimeRange,
        writer: &mut dyn DataSetWriter,
    ) -> Result<(), DataSourceError> {
        let batch = vec![DataSetMeasurement::new(t0()).with_value("Water", "1.0"); 64];
        loop {
            if let Err(err) = writer.write(&batch).await {
                let cancelled = matches!(err, WriteError::Cancelled) && writer.is_cancelled();
                if let Some(tx) = self.outcome.lock().take() {
                    let _ = tx.send(cancelled);
                }
                return Err(err.into());
            }
        }
    }
}

#[tokio::test]
async fn test_client_disconnect_stops_source() {
    let (tx, rx) = oneshot::channel();
    let ctx = ServerContext::new(ServerIdentity::new("S", "Server"));
    ctx.streams()
        .attach(
            DataSetEndPoint::new(water_stream("G1")).with_data_source(Arc::new(EndlessSource {
                outcome: Mutex::new(Some(tx)),
            })),
        )
        .unwrap();
    let app = create_router(Arc::new(ctx));

    let resp = send(&app, "GET", "/G1/dataset", Some("text/csv")).await;
    let mut body = resp.into_body();
    let first = body.frame().await.unwrap().unwrap();
    assert!(first.is_data());
    drop(body);

    let cancelled = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("source kept producing after disconnect")
        .unwrap();
    assert!(cancelled);
}
