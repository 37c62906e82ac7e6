//! HTTP transport seam
//!
//! The endpoint only ever issues GET requests and consumes the body as a
//! stream of chunks, so that is all a transport has to provide.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};

/// Response body as it arrives. An `Err` item means the exchange broke off.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: Url,
    pub accept: &'static str,
}

pub struct TransportResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Collect the whole body
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Transport backed by a `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, request: TransportRequest) -> Result<TransportResponse> {
        debug!(url = %request.url, accept = request.accept, "GET");

        let response = self
            .client
            .get(request.url)
            .header(ACCEPT, request.accept)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(ClientError::from))
            .boxed();

        Ok(TransportResponse { status, body })
    }
}
