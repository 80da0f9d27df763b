//! Per-chunk transforms

use crate::error::{SlotError, SlotResult};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Result of transforming one raw chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// Append this text and report it as a chunk
    Emit(String),
    /// Drop the raw chunk entirely
    Skip,
}

impl From<String> for Transformed {
    fn from(text: String) -> Self {
        Self::Emit(text)
    }
}

impl From<&str> for Transformed {
    fn from(text: &str) -> Self {
        Self::Emit(text.to_string())
    }
}

type TransformFn = dyn Fn(&str) -> SlotResult<Transformed> + Send + Sync;

/// Function applied to every raw chunk before it is accumulated
///
/// Runs inline in the read loop, so it should be pure and cheap. An `Err`
/// drops the chunk the same way [`Transformed::Skip`] does; the stream
/// keeps going.
#[derive(Clone)]
pub struct ChunkTransform(Arc<TransformFn>);

impl fmt::Debug for ChunkTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChunkTransform(..)")
    }
}

impl ChunkTransform {
    /// Wrap a transform function
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&str) -> SlotResult<Transformed> + Send + Sync + 'static,
    {
        Self(Arc::new(transform))
    }

    /// Apply the transform to a raw chunk
    pub fn apply(&self, raw: &str) -> SlotResult<Transformed> {
        (self.0)(raw)
    }
}

/// Transform for `data: {json}` lines that emits the string at `field`.
///
/// `field` is either a top-level key (`"t"`) or a JSON pointer
/// (`"/choices/0/delta/content"`). The `[DONE]` marker, blank payloads and
/// payloads without a string at `field` are skipped; payloads that are not
/// JSON are reported as transform errors.
pub fn sse_json_field(field: impl Into<String>) -> ChunkTransform {
    let field = field.into();

    ChunkTransform::new(move |raw| {
        let payload = raw.trim();
        let payload = payload
            .strip_prefix("data:")
            .map(str::trim_start)
            .unwrap_or(payload);

        if payload.is_empty() || payload == "[DONE]" {
            return Ok(Transformed::Skip);
        }

        let json: Value = serde_json::from_str(payload)
            .map_err(|e| SlotError::transform(format!("chunk is not JSON: {}", e)))?;

        let selected = if field.starts_with('/') {
            json.pointer(&field)
        } else {
            json.get(&field)
        };

        Ok(match selected.and_then(Value::as_str) {
            Some(text) => Transformed::Emit(text.to_string()),
            None => Transformed::Skip,
        })
    })
}
