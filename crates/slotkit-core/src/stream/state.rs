//! Observable state of a stream slot

use crate::controller::Phase;
use crate::error::SlotError;

/// Snapshot of a stream slot
///
/// `is_streaming` and `is_complete` are never both true. `accumulated` only
/// grows while one stream runs; it is cleared when the next one starts or on
/// reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamState {
    /// Text accumulated from transformed chunks
    pub accumulated: String,
    /// Whether a stream is being read
    pub is_streaming: bool,
    /// Whether the last stream reached end-of-data
    pub is_complete: bool,
    /// Error that ended the last stream
    pub error: Option<SlotError>,
}

impl StreamState {
    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        if self.is_streaming {
            Phase::Running
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.is_complete {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    pub(crate) fn begin(&mut self) {
        self.accumulated.clear();
        self.is_streaming = true;
        self.is_complete = false;
        self.error = None;
    }

    pub(crate) fn append(&mut self, piece: &str) {
        self.accumulated.push_str(piece);
    }

    pub(crate) fn complete(&mut self) {
        self.is_streaming = false;
        self.is_complete = true;
    }

    pub(crate) fn fail(&mut self, error: SlotError) {
        self.is_streaming = false;
        self.error = Some(error);
    }

    pub(crate) fn stop(&mut self) {
        self.is_streaming = false;
    }

    pub(crate) fn clear(&mut self) {
        self.accumulated.clear();
        self.is_complete = false;
        self.error = None;
    }
}
