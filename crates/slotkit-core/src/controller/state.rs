//! Observable state of an operation slot

use crate::error::SlotError;
use serde::Serialize;

/// Coarse lifecycle phase derived from an [`OperationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing running, no outcome recorded
    Idle,
    /// An invocation is in flight
    Running,
    /// The last invocation succeeded
    Success,
    /// The last invocation failed
    Failed,
}

/// Snapshot of a slot: last data, whether work is in flight, last outcome
///
/// `loading` is never true together with `success` or an `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationState<T> {
    /// Most recent successful value (or the initial data)
    pub data: Option<T>,
    /// Whether an invocation is in flight
    pub loading: bool,
    /// Error of the most recent failed invocation
    pub error: Option<SlotError>,
    /// Whether the most recent invocation succeeded
    pub success: bool,
}

impl<T> Default for OperationState<T> {
    fn default() -> Self {
        Self::at_rest(None)
    }
}

impl<T> OperationState<T> {
    /// State at construction (and after reset)
    pub fn at_rest(data: Option<T>) -> Self {
        Self {
            data,
            loading: false,
            error: None,
            success: false,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Running
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.success {
            Phase::Success
        } else {
            Phase::Idle
        }
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.success = false;
    }

    pub(crate) fn succeed(&mut self, value: T) {
        self.data = Some(value);
        self.loading = false;
        self.error = None;
        self.success = true;
    }

    pub(crate) fn fail(&mut self, error: SlotError) {
        self.loading = false;
        self.error = Some(error);
        self.success = false;
    }

    pub(crate) fn stop(&mut self) {
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state = OperationState::<u32>::default();
        assert_eq!(state.phase(), Phase::Idle);

        state.begin();
        assert_eq!(state.phase(), Phase::Running);

        state.fail(SlotError::operation("boom"));
        assert_eq!(state.phase(), Phase::Failed);
        assert!(!state.loading);

        state.begin();
        assert!(state.error.is_none());

        state.succeed(3);
        assert_eq!(state.phase(), Phase::Success);
        assert_eq!(state.data, Some(3));

        // data survives a new invocation starting
        state.begin();
        assert_eq!(state.data, Some(3));
        assert!(!state.success);
    }

    #[test]
    fn test_stop_leaves_outcome() {
        let mut state = OperationState::at_rest(Some("seed"));
        state.begin();
        state.stop();

        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.data, Some("seed"));
    }
}
