//! Stream consumer configuration and handlers

use super::decoder::ChunkFraming;
use super::request::{Method, RequestDescription};
use super::transform::{ChunkTransform, Transformed};
use crate::controller::ErrorHandler;
use crate::error::{SlotError, SlotResult};
use std::sync::Arc;

/// Handler fired with text: a transformed chunk, or the full accumulated text
pub type TextHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Optional event handlers for a stream consumer
#[derive(Clone, Default)]
pub struct StreamHandlers {
    pub on_chunk: Option<TextHandler>,
    pub on_complete: Option<TextHandler>,
    pub on_error: Option<ErrorHandler>,
}

impl std::fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandlers")
            .field("on_chunk", &self.on_chunk.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl StreamHandlers {
    pub(crate) fn chunk(&self, piece: &str) {
        if let Some(handler) = &self.on_chunk {
            handler(piece);
        }
    }

    pub(crate) fn complete(&self, text: &str) {
        if let Some(handler) = &self.on_complete {
            handler(text);
        }
    }

    pub(crate) fn error(&self, error: &SlotError) {
        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }
}

/// Configuration of a [`StreamConsumer`](super::StreamConsumer)
#[derive(Debug, Clone, Default)]
pub struct StreamConfig {
    /// Base request, merged with any per-call override
    pub request: RequestDescription,
    /// Transform applied to each raw chunk
    pub transform: Option<ChunkTransform>,
    /// How reads are cut into raw chunks
    pub framing: ChunkFraming,
    /// Event handlers
    pub handlers: StreamHandlers,
}

impl StreamConfig {
    /// Create a config for a POST to `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_request(RequestDescription::new(endpoint))
    }

    /// Create a config from a full request description
    pub fn from_request(request: RequestDescription) -> Self {
        Self {
            request,
            ..Default::default()
        }
    }

    /// Set the method
    pub fn with_method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    /// Add a header to the base request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    /// Set the chunk framing
    pub fn with_framing(mut self, framing: ChunkFraming) -> Self {
        self.framing = framing;
        self
    }

    /// Set a prebuilt transform
    pub fn with_transform(mut self, transform: ChunkTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the transform from a function
    pub fn transform_with<F>(self, transform: F) -> Self
    where
        F: Fn(&str) -> SlotResult<Transformed> + Send + Sync + 'static,
    {
        self.with_transform(ChunkTransform::new(transform))
    }

    /// Set the per-chunk handler
    pub fn on_chunk(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers.on_chunk = Some(Arc::new(handler));
        self
    }

    /// Set the completion handler
    pub fn on_complete(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.handlers.on_complete = Some(Arc::new(handler));
        self
    }

    /// Set the error handler
    pub fn on_error(mut self, handler: impl Fn(&SlotError) + Send + Sync + 'static) -> Self {
        self.handlers.on_error = Some(Arc::new(handler));
        self
    }
}
