//! Chunk sources: where stream bytes come from

use super::request::{Method, RequestDescription};
use crate::error::{SlotError, SlotResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;

/// Stream of raw reads from an open connection
pub type ByteStream = Pin<Box<dyn Stream<Item = SlotResult<Bytes>> + Send>>;

/// Opens a connection for a request and yields its body incrementally
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// Open a connection for `request`
    async fn open(&self, request: &RequestDescription) -> SlotResult<ByteStream>;
}

/// HTTP chunk source backed by `reqwest`
#[derive(Debug, Clone, Default)]
pub struct HttpChunkSource {
    client: reqwest::Client,
}

impl HttpChunkSource {
    /// Create a source with a default client
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source with a preconfigured client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn open(&self, request: &RequestDescription) -> SlotResult<ByteStream> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.endpoint),
            Method::Post => self.client.post(&request.endpoint),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!(endpoint = %request.endpoint, %status, "stream connection opened");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SlotError::http(status.as_u16(), message));
        }

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| SlotError::connection(format!("Stream error: {}", e)))
        });
        Ok(Box::pin(body))
    }
}

/// Source that replays a fixed script of reads
///
/// Every `open` replays the same script from the start, pausing `interval`
/// before each read. Useful for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    reads: Vec<SlotResult<Bytes>>,
    interval: Duration,
    open_error: Option<SlotError>,
}

impl ScriptedSource {
    /// Create a source from text reads
    pub fn new<I, S>(reads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reads: reads
                .into_iter()
                .map(|read| Ok(Bytes::from(read.into())))
                .collect(),
            ..Default::default()
        }
    }

    /// Create a source whose connections always fail to open
    pub fn failing(error: SlotError) -> Self {
        Self {
            open_error: Some(error),
            ..Default::default()
        }
    }

    /// Pause before every read
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Append a read of raw bytes
    pub fn then_bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.reads.push(Ok(bytes.into()));
        self
    }

    /// Append a transport failure
    pub fn then_fail(mut self, error: SlotError) -> Self {
        self.reads.push(Err(error));
        self
    }
}

#[async_trait]
impl ChunkSource for ScriptedSource {
    async fn open(&self, _request: &RequestDescription) -> SlotResult<ByteStream> {
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }

        let interval = self.interval;
        let reads = stream::iter(self.reads.clone()).then(move |read| async move {
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            read
        });
        Ok(Box::pin(reads))
    }
}
