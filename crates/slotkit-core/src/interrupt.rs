//! Invocation tokens: cancellation and supersession for a single slot
//!
//! Every slot owns one [`TokenSource`]. Starting an invocation mints a new
//! [`InvocationToken`] and invalidates the previous one. In-flight work keeps
//! its own copy of the token and must check it with
//! [`TokenSource::status`] after every suspension point, before touching any
//! shared state.

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Handle for one authorized attempt inside a slot
#[derive(Debug, Clone)]
pub struct InvocationToken {
    generation: u64,
    cancel: CancellationToken,
}

impl InvocationToken {
    /// Generation this token was minted for
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Check if this token has been cancelled or superseded
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait until the token is cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Underlying cancellation token, for handing to collaborators
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive `future` until it finishes or the token is cancelled.
    ///
    /// Returns `None` when cancellation won the race. The future is dropped
    /// at that point, so any work it had in flight stops at its next
    /// suspension point.
    pub async fn guard<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            output = future => Some(output),
        }
    }
}

/// Result of checking a token against its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    /// The token is the live one; mutations are allowed
    Live,
    /// A newer invocation replaced this one
    Superseded,
    /// The invocation was cancelled (cancel, abort or reset)
    Cancelled,
}

impl TokenStatus {
    /// Check if the token may still apply effects
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }

    /// Convert a non-live status into the matching error
    pub fn into_error(self) -> Option<crate::error::SlotError> {
        match self {
            Self::Live => None,
            Self::Superseded => Some(crate::error::SlotError::Superseded),
            Self::Cancelled => Some(crate::error::SlotError::Cancelled),
        }
    }
}

/// Issues tokens for one slot
///
/// Not synchronized by itself: the owner keeps it behind the same lock that
/// guards the slot's state so that a status check and the mutation it
/// authorizes are atomic.
#[derive(Debug)]
pub struct TokenSource {
    generation: u64,
    current: CancellationToken,
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource {
    /// Create a token source with no invocation in flight
    pub fn new() -> Self {
        Self {
            generation: 0,
            current: CancellationToken::new(),
        }
    }

    /// Current generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Invalidate the live token and mint its successor
    pub fn mint(&mut self) -> InvocationToken {
        self.supersede();
        InvocationToken {
            generation: self.generation,
            cancel: self.current.clone(),
        }
    }

    /// Invalidate the live token without handing out a new one
    pub fn supersede(&mut self) {
        self.current.cancel();
        self.generation += 1;
        self.current = CancellationToken::new();
    }

    /// Cancel the live token, keeping the generation
    pub fn cancel(&mut self) {
        self.current.cancel();
    }

    /// Check whether `token` may still apply its effects
    pub fn status(&self, token: &InvocationToken) -> TokenStatus {
        if token.generation != self.generation {
            TokenStatus::Superseded
        } else if token.cancel.is_cancelled() {
            TokenStatus::Cancelled
        } else {
            TokenStatus::Live
        }
    }
}
