//! Retry policies for failed invocations
//!
//! - [`RetryConfig`]: how many automatic retries, and how far apart
//! - [`RetryScheduler`]: turns a failure count into a retry decision
//! - [`backoff`]: constant and exponential delay strategies

pub mod backoff;
pub mod retry;

pub use backoff::{BackoffKind, BackoffStrategy, ConstantBackoff, ExponentialBackoff};
pub use retry::{RetryConfig, RetryDecision, RetryScheduler};
