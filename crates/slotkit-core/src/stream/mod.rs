//! Stream consumer: incremental reading of a chunked response
//!
//! A [`StreamConsumer`] owns one stream slot. Starting a stream supersedes
//! the one in flight, opens a connection through its [`ChunkSource`], and
//! reads it until end-of-data, failure or abort. Each raw chunk goes through
//! the optional [`ChunkTransform`]; emitted text is appended to the
//! accumulated buffer and reported to the `on_chunk` handler.
//!
//! ```no_run
//! use slotkit_core::stream::{
//!     ChunkFraming, HttpChunkSource, StreamConfig, StreamConsumer, transform,
//! };
//!
//! # async fn example() {
//! let config = StreamConfig::new("http://localhost:8080/v1/chat")
//!     .with_framing(ChunkFraming::Lines)
//!     .with_transform(transform::sse_json_field("/choices/0/delta/content"))
//!     .on_chunk(|piece| print!("{}", piece));
//!
//! let consumer = StreamConsumer::new(HttpChunkSource::new(), config);
//! let outcome = consumer.start_stream(None).await;
//! println!("\n{:?}", outcome);
//! # }
//! ```

mod decoder;
mod options;
mod request;
mod source;
mod state;
pub mod transform;


pub use decoder::{ChunkDecoder, ChunkFraming};
pub use options::{StreamConfig, StreamHandlers, TextHandler};
pub use request::{Method, RequestDescription, RequestOverride};
pub use source::{ByteStream, ChunkSource, HttpChunkSource, ScriptedSource};
pub use state::StreamState;
pub use transform::{ChunkTransform, Transformed};

use crate::error::SlotError;
use crate::interrupt::{InvocationToken, TokenSource, TokenStatus};
use futures::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// How a stream run ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// End-of-data reached; carries the full accumulated text
    Completed(String),
    /// Stopped by `abort` or `reset`
    Aborted,
    /// Replaced by a newer stream
    Superseded,
    /// Opening or reading failed
    Failed(SlotError),
}

impl StreamOutcome {
    fn interrupted(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Superseded => Self::Superseded,
            TokenStatus::Cancelled | TokenStatus::Live => Self::Aborted,
        }
    }

    /// Check if the stream ran to completion
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

struct Inner<S> {
    source: S,
    config: StreamConfig,
    tokens: Mutex<TokenSource>,
    state: watch::Sender<StreamState>,
}

/// Consumes a chunked response into an accumulated text buffer
///
/// Cloning is cheap and yields a handle to the same slot.
pub struct StreamConsumer<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for StreamConsumer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> std::fmt::Debug for StreamConsumer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConsumer")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<S: ChunkSource + 'static> StreamConsumer<S> {
    /// Create a consumer reading from `source`
    pub fn new(source: S, config: StreamConfig) -> Self {
        let (state, _) = watch::channel(StreamState::default());
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                tokens: Mutex::new(TokenSource::new()),
                state,
            }),
        }
    }

    /// Start a stream and read it to its end.
    ///
    /// `overlay` is merged on top of the configured request. Any stream
    /// already running in this slot is superseded.
    pub async fn start_stream(&self, overlay: Option<RequestOverride>) -> StreamOutcome {
        let (token, request) = self.begin(overlay.as_ref());
        self.drive(token, request).await
    }

    /// Start a stream on a background task.
    ///
    /// The slot switches to the new stream before this returns, so an
    /// `abort` issued right after is never lost.
    pub fn spawn(&self, overlay: Option<RequestOverride>) -> JoinHandle<StreamOutcome> {
        let (token, request) = self.begin(overlay.as_ref());
        let consumer = self.clone();
        tokio::spawn(async move { consumer.drive(token, request).await })
    }

    /// Stop the running stream at its next suspension point.
    ///
    /// Accumulated text stays; no completion or error is reported.
    pub fn abort(&self) {
        let mut tokens = self.inner.tokens.lock();
        tokens.cancel();
        self.inner.state.send_modify(StreamState::stop);
        debug!(generation = tokens.generation(), "stream aborted");
    }

    /// Abort, then clear accumulated text, error and completion
    pub fn reset(&self) {
        let mut tokens = self.inner.tokens.lock();
        tokens.cancel();
        self.inner.state.send_modify(|state| {
            state.stop();
            state.clear();
        });
        debug!(generation = tokens.generation(), "stream reset");
    }

    /// Snapshot of the current state
    pub fn state(&self) -> StreamState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.inner.state.subscribe()
    }

    fn begin(&self, overlay: Option<&RequestOverride>) -> (InvocationToken, RequestDescription) {
        let base = &self.inner.config.request;
        let request = match overlay {
            Some(overlay) => base.merged(overlay),
            None => base.clone(),
        };

        let mut tokens = self.inner.tokens.lock();
        let token = tokens.mint();
        self.inner.state.send_modify(StreamState::begin);
        (token, request)
    }

    #[instrument(skip_all, fields(endpoint = %request.endpoint, method = %request.method, generation = token.generation()))]
    async fn drive(&self, token: InvocationToken, request: RequestDescription) -> StreamOutcome {
        info!("stream started");

        let mut body = match token.guard(self.inner.source.open(&request)).await {
            None => return self.interrupted(&token),
            Some(Err(error)) => return self.fail(&token, error),
            Some(Ok(body)) => body,
        };

        let mut decoder = ChunkDecoder::new(self.inner.config.framing);
        loop {
            match token.guard(body.next()).await {
                None => return self.interrupted(&token),
                Some(None) => {
                    for raw in decoder.finish() {
                        if let Err(outcome) = self.consume(&token, &raw) {
                            return outcome;
                        }
                    }
                    return self.complete(&token);
                }
                Some(Some(Err(error))) => return self.fail(&token, error),
                Some(Some(Ok(bytes))) => {
                    for raw in decoder.feed(&bytes) {
                        if let Err(outcome) = self.consume(&token, &raw) {
                            return outcome;
                        }
                    }
                }
            }
        }
    }

    /// Transform one raw chunk and append it; `Err` carries the outcome if
    /// the token went stale
    fn consume(&self, token: &InvocationToken, raw: &str) -> Result<(), StreamOutcome> {
        let piece = match &self.inner.config.transform {
            None => raw.to_string(),
            Some(transform) => match transform.apply(raw) {
                Ok(Transformed::Emit(piece)) => piece,
                Ok(Transformed::Skip) => return Ok(()),
                Err(e) => {
                    debug!("transform failed, skipping chunk: {}", e);
                    return Ok(());
                }
            },
        };

        {
            let tokens = self.inner.tokens.lock();
            let status = tokens.status(token);
            if !status.is_live() {
                return Err(StreamOutcome::interrupted(status));
            }
            self.inner.state.send_modify(|state| state.append(&piece));
        }

        self.inner.config.handlers.chunk(&piece);
        Ok(())
    }

    fn complete(&self, token: &InvocationToken) -> StreamOutcome {
        let text = {
            let tokens = self.inner.tokens.lock();
            let status = tokens.status(token);
            if !status.is_live() {
                return StreamOutcome::interrupted(status);
            }
            self.inner.state.send_modify(StreamState::complete);
            self.inner.state.borrow().accumulated.clone()
        };

        info!(chars = text.chars().count(), "stream complete");
        self.inner.config.handlers.complete(&text);
        StreamOutcome::Completed(text)
    }

    fn fail(&self, token: &InvocationToken, error: SlotError) -> StreamOutcome {
        {
            let tokens = self.inner.tokens.lock();
            let status = tokens.status(token);
            if !status.is_live() {
                debug!(?status, "dropping error from stale stream: {}", error);
                return StreamOutcome::interrupted(status);
            }
            let failed = error.clone();
            self.inner.state.send_modify(|state| state.fail(failed));
        }

        warn!("stream failed: {}", error);
        self.inner.config.handlers.error(&error);
        StreamOutcome::Failed(error)
    }

    fn interrupted(&self, token: &InvocationToken) -> StreamOutcome {
        let status = self.inner.tokens.lock().status(token);
        debug!(?status, "stream interrupted");
        StreamOutcome::interrupted(status)
    }
}
