//! Retry scheduling for failed invocations
//!
//! The scheduler only decides; the slot that owns it performs the delayed
//! re-invocation so the retry runs through the normal invocation path.

use super::backoff::{BackoffKind, BackoffStrategy, ConstantBackoff, ExponentialBackoff};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for automatic retries
///
/// # Example
/// ```
/// use slotkit_core::recovery::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_max_attempts(2)
///     .with_delay(Duration::from_millis(10));
/// assert_eq!(config.max_attempts, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of automatic retries after failed attempts
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
    /// How the delay evolves across retries
    pub backoff: BackoffKind,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            delay: Duration::from_secs(1),
            backoff: BackoffKind::Constant,
        }
    }
}

impl RetryConfig {
    /// Create a config that never retries
    pub fn no_retry() -> Self {
        Self::default()
    }

    /// Create a config with a fixed delay between retries
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: BackoffKind::Constant,
        }
    }

    /// Set max attempts
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the delay before the first retry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Grow the delay exponentially, capped at `max_delay`
    pub fn with_exponential_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.backoff = BackoffKind::Exponential {
            multiplier,
            max_delay,
        };
        self
    }

    /// Build the backoff strategy described by this config
    pub fn create_backoff(&self) -> Box<dyn BackoffStrategy> {
        match self.backoff {
            BackoffKind::Constant => Box::new(ConstantBackoff::new(self.delay)),
            BackoffKind::Exponential {
                multiplier,
                max_delay,
            } => Box::new(ExponentialBackoff::new(self.delay, multiplier, max_delay)),
        }
    }
}

/// Outcome of a retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-invoke after `delay`; `attempt` is the 1-based retry number
    Retry { attempt: u32, delay: Duration },
    /// Leave the failure as the final state
    GiveUp,
}

/// Decides whether and when a failed attempt is retried
pub struct RetryScheduler {
    config: RetryConfig,
    backoff: Box<dyn BackoffStrategy>,
}

impl std::fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryScheduler {
    /// Create a scheduler for `config`
    pub fn new(config: RetryConfig) -> Self {
        let backoff = config.create_backoff();
        Self { config, backoff }
    }

    /// Get the retry configuration
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Decide what to do after a failure, given how many retries were
    /// already scheduled since the last success
    pub fn decide(&self, attempts_so_far: u32) -> RetryDecision {
        if attempts_so_far < self.config.max_attempts {
            RetryDecision::Retry {
                attempt: attempts_so_far + 1,
                delay: self.backoff.delay_for_attempt(attempts_so_far),
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}
