//! Operation controller: one asynchronous operation per slot
//!
//! An [`OperationController`] wraps an async operation and owns a single
//! slot for it. Each call to [`OperationController::execute`] supersedes
//! whatever was still in flight, optionally serves a fresh cached value
//! instead of invoking the operation, records the outcome in an observable
//! [`OperationState`], writes successes through to the cache, and schedules
//! automatic retries after failures.
//!
//! # Example
//!
//! ```no_run
//! use slotkit_core::cache::CachePolicy;
//! use slotkit_core::controller::{ControllerOptions, OperationController};
//! use slotkit_core::error::SlotError;
//! use slotkit_core::recovery::RetryConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> slotkit_core::error::SlotResult<()> {
//! let controller = OperationController::with_options(
//!     |id: String| async move { Ok::<_, SlotError>(format!("user:{}", id)) },
//!     ControllerOptions::new()
//!         .with_cache(CachePolicy::new("user", Duration::from_secs(30)))
//!         .with_retry(RetryConfig::fixed(2, Duration::from_millis(10))),
//! );
//!
//! let user = controller.execute("7".to_string()).await?;
//! assert_eq!(user, "user:7");
//! assert!(controller.state().success);
//! # Ok(())
//! # }
//! ```

mod options;
mod state;

#[cfg(test)]
mod tests;

pub use options::{ControllerOptions, ErrorHandler, Handlers, SuccessHandler};
pub use state::{OperationState, Phase};

use crate::cache;
use crate::error::{SlotError, SlotResult};
use crate::interrupt::{InvocationToken, TokenSource, TokenStatus};
use crate::recovery::{RetryDecision, RetryScheduler};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

type BoxedOperation<A, T> = Arc<dyn Fn(A) -> BoxFuture<'static, SlotResult<T>> + Send + Sync>;

/// Who started an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// A direct call to `execute` or `retry`
    Caller,
    /// A retry scheduled after a failure; skips the cache
    Scheduled,
}

/// Slot bookkeeping, guarded by one lock together with state publication
struct Slot<A> {
    tokens: TokenSource,
    last_args: Option<A>,
    retry_count: u32,
}

struct Inner<A, T> {
    operation: BoxedOperation<A, T>,
    options: ControllerOptions<T>,
    scheduler: RetryScheduler,
    slot: Mutex<Slot<A>>,
    state: watch::Sender<OperationState<T>>,
}

/// Runs one asynchronous operation per slot
///
/// `A` is the argument bundle passed to the operation (use a tuple for
/// several arguments). Cloning is cheap and yields a handle to the same
/// slot.
pub struct OperationController<A, T> {
    inner: Arc<Inner<A, T>>,
}

impl<A, T> Clone for OperationController<A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, T> std::fmt::Debug for OperationController<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationController")
            .field("cache", &self.inner.options.cache)
            .field("retry", self.inner.scheduler.config())
            .finish_non_exhaustive()
    }
}

impl<A, T> OperationController<A, T>
where
    A: Clone + Send + Sync + 'static,
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a controller with default options (no cache, no retries)
    pub fn new<F, Fut, E>(operation: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<SlotError> + 'static,
    {
        Self::with_options(operation, ControllerOptions::default())
    }

    /// Create a controller with the given options
    pub fn with_options<F, Fut, E>(operation: F, options: ControllerOptions<T>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<SlotError> + 'static,
    {
        let operation: BoxedOperation<A, T> = Arc::new(move |args| {
            let pending = operation(args);
            Box::pin(async move { pending.await.map_err(Into::into) })
        });
        let scheduler = RetryScheduler::new(options.retry.clone());
        let (state, _) = watch::channel(OperationState::at_rest(options.initial_data.clone()));

        Self {
            inner: Arc::new(Inner {
                operation,
                options,
                scheduler,
                slot: Mutex::new(Slot {
                    tokens: TokenSource::new(),
                    last_args: None,
                    retry_count: 0,
                }),
                state,
            }),
        }
    }

    /// Run the operation with `args`, superseding any invocation in flight.
    ///
    /// Returns the value on success and the error on failure; either way the
    /// outcome is also recorded in the slot state. If this invocation is
    /// itself superseded or cancelled before it finishes, its outcome is
    /// discarded and `SlotError::Superseded` / `SlotError::Cancelled` is
    /// returned.
    pub async fn execute(&self, args: A) -> SlotResult<T> {
        self.run(args, Trigger::Caller).await
    }

    /// Re-run with the most recent arguments, resetting the retry counter.
    ///
    /// Resolves to `Ok(None)` if the controller was never executed.
    pub async fn retry(&self) -> SlotResult<Option<T>> {
        let args = {
            let mut slot = self.inner.slot.lock();
            slot.retry_count = 0;
            slot.last_args.clone()
        };

        match args {
            Some(args) => self.execute(args).await.map(Some),
            None => {
                debug!("retry requested before any invocation");
                Ok(None)
            }
        }
    }

    /// Cancel anything in flight and return the state to rest.
    ///
    /// The cache store is left untouched.
    pub fn reset(&self) {
        let mut slot = self.inner.slot.lock();
        slot.tokens.cancel();
        slot.retry_count = 0;
        let initial = self.inner.options.initial_data.clone();
        self.inner
            .state
            .send_modify(|state| *state = OperationState::at_rest(initial));
        debug!(generation = slot.tokens.generation(), "slot reset");
    }

    /// Stop waiting for the invocation in flight.
    ///
    /// Only `loading` changes; data and the last outcome stay visible.
    pub fn cancel(&self) {
        let mut slot = self.inner.slot.lock();
        slot.tokens.cancel();
        self.inner.state.send_modify(OperationState::stop);
        debug!(generation = slot.tokens.generation(), "slot cancelled");
    }

    /// Snapshot of the current state
    pub fn state(&self) -> OperationState<T> {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<OperationState<T>> {
        self.inner.state.subscribe()
    }

    /// Number of automatic retries scheduled since the last success or reset
    pub fn retry_count(&self) -> u32 {
        self.inner.slot.lock().retry_count
    }

    async fn run(&self, args: A, trigger: Trigger) -> SlotResult<T> {
        if trigger == Trigger::Caller {
            if let Some(value) = self.serve_from_cache(&args) {
                return Ok(value);
            }
        }

        let token = {
            let mut slot = self.inner.slot.lock();
            let token = slot.tokens.mint();
            slot.last_args = Some(args.clone());
            self.inner.state.send_modify(OperationState::begin);
            token
        };
        debug!(generation = token.generation(), ?trigger, "invocation started");

        let Some(result) = token.guard((self.inner.operation)(args.clone())).await else {
            let status = self.inner.slot.lock().tokens.status(&token);
            debug!(generation = token.generation(), ?status, "invocation interrupted");
            return Err(status.into_error().unwrap_or(SlotError::Cancelled));
        };

        self.apply(token, args, result)
    }

    /// Serve a fresh cache entry, if the policy allows one
    fn serve_from_cache(&self, args: &A) -> Option<T> {
        let options = &self.inner.options;
        let value: T = cache::lookup_fresh(options.store.as_ref(), &options.cache, Instant::now())?;

        {
            let mut slot = self.inner.slot.lock();
            // A late completion from older work must not overwrite the hit
            slot.tokens.supersede();
            slot.last_args = Some(args.clone());
            slot.retry_count = 0;
            let cached = value.clone();
            self.inner.state.send_modify(|state| state.succeed(cached));
        }
        debug!(key = ?options.cache.key, "served from cache");

        options.handlers.success(&value);
        Some(value)
    }

    /// Apply a finished invocation's result if its token is still live
    fn apply(&self, token: InvocationToken, args: A, result: SlotResult<T>) -> SlotResult<T> {
        let options = &self.inner.options;
        let mut slot = self.inner.slot.lock();

        let status = slot.tokens.status(&token);
        if status != TokenStatus::Live {
            debug!(generation = token.generation(), ?status, "discarding stale result");
            return Err(status.into_error().unwrap_or(SlotError::Cancelled));
        }

        match result {
            Ok(value) => {
                cache::write_through(options.store.as_ref(), &options.cache, &value, Instant::now());
                slot.retry_count = 0;
                let applied = value.clone();
                self.inner.state.send_modify(|state| state.succeed(applied));
                drop(slot);

                debug!(generation = token.generation(), "invocation succeeded");
                options.handlers.success(&value);
                Ok(value)
            }
            Err(error) => {
                let failed = error.clone();
                self.inner.state.send_modify(|state| state.fail(failed));
                let decision = self.inner.scheduler.decide(slot.retry_count);
                if let RetryDecision::Retry { .. } = decision {
                    slot.retry_count += 1;
                }
                drop(slot);

                warn!(generation = token.generation(), "invocation failed: {}", error);
                options.handlers.error(&error);

                if let RetryDecision::Retry { attempt, delay } = decision {
                    self.schedule_retry(token, args, attempt, delay);
                }
                Err(error)
            }
        }
    }

    /// Re-run `args` after `delay`, unless the failed invocation's token is
    /// invalidated first
    fn schedule_retry(&self, token: InvocationToken, args: A, attempt: u32, delay: Duration) {
        debug!(attempt, delay_ms = delay.as_millis() as u64, "scheduling retry");
        let controller = self.clone();

        tokio::spawn(async move {
            if token.guard(tokio::time::sleep(delay)).await.is_none() {
                debug!(attempt, "scheduled retry dropped");
                return;
            }
            if !controller.inner.slot.lock().tokens.status(&token).is_live() {
                debug!(attempt, "scheduled retry dropped");
                return;
            }

            if let Err(e) = controller.run(args, Trigger::Scheduled).await {
                debug!(attempt, "scheduled retry ended with error: {}", e);
            }
        });
    }
}
