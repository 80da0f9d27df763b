//! Controller options and event handlers

use crate::cache::{CachePolicy, CacheStore, MemoryCacheStore};
use crate::error::SlotError;
use crate::recovery::RetryConfig;
use std::sync::Arc;

/// Handler fired with the value of a successful invocation
pub type SuccessHandler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handler fired with the error of a failed invocation
pub type ErrorHandler = Arc<dyn Fn(&SlotError) + Send + Sync>;

/// Optional event handlers for a controller
///
/// Handlers run synchronously, once per applied outcome. Outcomes of
/// superseded or cancelled invocations never reach them.
pub struct Handlers<T> {
    pub on_success: Option<SuccessHandler<T>>,
    pub on_error: Option<ErrorHandler>,
}

impl<T> Default for Handlers<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> Clone for Handlers<T> {
    fn clone(&self) -> Self {
        Self {
            on_success: self.on_success.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Handlers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<T> Handlers<T> {
    pub(crate) fn success(&self, value: &T) {
        if let Some(handler) = &self.on_success {
            handler(value);
        }
    }

    pub(crate) fn error(&self, error: &SlotError) {
        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }
}

/// Options for an [`OperationController`](super::OperationController)
#[derive(Debug)]
pub struct ControllerOptions<T> {
    /// Cache key and staleness window
    pub cache: CachePolicy,
    /// Store consulted and written according to `cache`
    pub store: Arc<dyn CacheStore>,
    /// Automatic retry behavior
    pub retry: RetryConfig,
    /// Event handlers
    pub handlers: Handlers<T>,
    /// Data visible before the first success (and after reset)
    pub initial_data: Option<T>,
}

impl<T> Default for ControllerOptions<T> {
    fn default() -> Self {
        Self {
            cache: CachePolicy::default(),
            store: Arc::new(MemoryCacheStore::unbounded()),
            retry: RetryConfig::no_retry(),
            handlers: Handlers::default(),
            initial_data: None,
        }
    }
}

impl<T> ControllerOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache policy
    pub fn with_cache(mut self, cache: CachePolicy) -> Self {
        self.cache = cache;
        self
    }

    /// Use a shared cache store
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = store;
        self
    }

    /// Set the retry config
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the data visible before the first success
    pub fn with_initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(data);
        self
    }

    /// Set the success handler
    pub fn on_success(mut self, handler: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.handlers.on_success = Some(Arc::new(handler));
        self
    }

    /// Set the error handler
    pub fn on_error(mut self, handler: impl Fn(&SlotError) + Send + Sync + 'static) -> Self {
        self.handlers.on_error = Some(Arc::new(handler));
        self
    }
}
