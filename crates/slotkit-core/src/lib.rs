//! Slotkit Core Library
//!
//! Single-slot asynchronous operations with cancellation, automatic retry,
//! stale-while-revalidate caching, and incremental stream consumption.
//!
//! - [`OperationController`] runs one operation per slot and tracks it in an
//!   observable [`OperationState`].
//! - [`StreamConsumer`] reads a chunked response into an accumulated buffer.
//! - Both supersede in-flight work through [`interrupt::TokenSource`].

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod interrupt;
pub mod recovery;
pub mod stream;

// Re-export commonly used types
pub use cache::{CacheEntry, CachePolicy, CacheStore, MemoryCacheStore};
pub use config::{CacheConfig, LoggingConfig, SlotkitConfig, StreamSettings};
pub use controller::{ControllerOptions, OperationController, OperationState, Phase};
pub use error::{SlotError, SlotResult};
pub use interrupt::{InvocationToken, TokenSource, TokenStatus};
pub use recovery::{RetryConfig, RetryScheduler};
pub use stream::{
    ChunkSource, ChunkTransform, HttpChunkSource, RequestDescription, RequestOverride,
    StreamConfig, StreamConsumer, StreamOutcome, StreamState, Transformed,
};
