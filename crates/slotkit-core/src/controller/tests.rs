//! Operation controller tests

use super::*;
use crate::cache::{CachePolicy, CacheStore, MemoryCacheStore};
use crate::recovery::RetryConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::time::sleep;

fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

/// Operation that fails its first `failures` calls, then returns `user:<id>`
fn flaky_user(
    calls: Arc<AtomicU32>,
    failures: u32,
) -> impl Fn(String) -> BoxFuture<'static, SlotResult<String>> + Send + Sync + 'static {
    move |id: String| {
        let calls = calls.clone();
        Box::pin(async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < failures {
                Err(SlotError::operation(format!("attempt {} failed", n + 1)))
            } else {
                Ok(format!("user:{}", id))
            }
        })
    }
}

#[tokio::test]
async fn test_execute_success_updates_state() {
    let calls = counter();
    let successes = counter();
    let seen = successes.clone();

    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 0),
        ControllerOptions::new().on_success(move |_: &String| {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    );

    assert_eq!(controller.state().phase(), Phase::Idle);

    let value = controller.execute("7".to_string()).await.unwrap();
    assert_eq!(value, "user:7");

    let state = controller.state();
    assert_eq!(state.data.as_deref(), Some("user:7"));
    assert!(state.success);
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(successes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_execute_failure_is_recorded_and_returned() {
    let errors = counter();
    let seen = errors.clone();

    let controller = OperationController::with_options(
        flaky_user(counter(), u32::MAX),
        ControllerOptions::new().on_error(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let result = controller.execute("7".to_string()).await;
    assert_eq!(result, Err(SlotError::operation("attempt 1 failed")));

    let state = controller.state();
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.error, Some(SlotError::operation("attempt 1 failed")));
    assert!(!state.success);
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_cache_entry_skips_invocation() {
    let calls = counter();
    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 0),
        ControllerOptions::new().with_cache(CachePolicy::new("user", Duration::from_secs(5))),
    );

    let first = controller.execute("7".to_string()).await.unwrap();
    sleep(Duration::from_secs(4)).await;
    let second = controller.execute("8".to_string()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(controller.state().success);

    // past the window the operation runs again
    sleep(Duration::from_secs(2)).await;
    let third = controller.execute("8".to_string()).await.unwrap();
    assert_eq!(third, "user:8");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_write_only_cache_never_serves() {
    let calls = counter();
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::unbounded());
    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 0),
        ControllerOptions::new()
            .with_cache(CachePolicy::write_only("user"))
            .with_store(store.clone()),
    );

    controller.execute("1".to_string()).await.unwrap();
    controller.execute("2".to_string()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        store.get("user").map(|entry| entry.value),
        Some(serde_json::json!("user:2"))
    );
}

#[tokio::test]
async fn test_store_is_shared_between_controllers() {
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::unbounded());
    let policy = CachePolicy::new("profile", Duration::from_secs(60));
    let writer_calls = counter();
    let reader_calls = counter();

    let writer = OperationController::with_options(
        flaky_user(writer_calls.clone(), 0),
        ControllerOptions::new()
            .with_cache(policy.clone())
            .with_store(store.clone()),
    );
    let reader = OperationController::with_options(
        flaky_user(reader_calls.clone(), 0),
        ControllerOptions::new().with_cache(policy).with_store(store),
    );

    writer.execute("42".to_string()).await.unwrap();
    let value = reader.execute("99".to_string()).await.unwrap();

    assert_eq!(value, "user:42");
    assert_eq!(reader_calls.load(Ordering::SeqCst), 0);
    assert_eq!(reader.state().data.as_deref(), Some("user:42"));
}

#[tokio::test(start_paused = true)]
async fn test_failure_then_scheduled_retry_succeeds() {
    let calls = counter();
    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 1),
        ControllerOptions::new().with_retry(RetryConfig::fixed(2, Duration::from_millis(10))),
    );

    // the caller still observes the first failure
    let first = controller.execute("7".to_string()).await;
    assert!(first.is_err());
    assert!(controller.state().error.is_some());
    assert_eq!(controller.retry_count(), 1);

    sleep(Duration::from_millis(50)).await;

    let state = controller.state();
    assert_eq!(state.data.as_deref(), Some("user:7"));
    assert!(state.success);
    assert!(state.error.is_none());
    assert_eq!(controller.retry_count(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_n_failures_then_success_with_max_attempts_n() {
    let calls = counter();
    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 3),
        ControllerOptions::new().with_retry(RetryConfig::fixed(3, Duration::from_millis(10))),
    );

    let _ = controller.execute("1".to_string()).await;
    sleep(Duration::from_secs(1)).await;

    assert!(controller.state().success);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_leave_error() {
    let calls = counter();
    let errors = counter();
    let seen = errors.clone();
    let controller = OperationController::with_options(
        flaky_user(calls.clone(), 4),
        ControllerOptions::new()
            .with_retry(RetryConfig::fixed(3, Duration::from_millis(10)))
            .on_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let _ = controller.execute("1".to_string()).await;
    sleep(Duration::from_secs(1)).await;

    let state = controller.state();
    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.error, Some(SlotError::operation("attempt 4 failed")));
    // one direct attempt plus three scheduled retries
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(errors.load(Ordering::SeqCst), 4);
    assert_eq!(controller.retry_count(), 3);
}

/// Operation taking `(label, delay_ms)` that returns the label after the delay
fn delayed_label(
    calls: Arc<AtomicU32>,
) -> impl Fn((&'static str, u64)) -> BoxFuture<'static, SlotResult<String>> + Send + Sync + 'static
{
    move |(label, delay_ms)| {
        let calls = calls.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(delay_ms)).await;
            Ok(label.to_string())
        })
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_call_wins_when_first_would_finish_last() {
    let successes = counter();
    let seen = successes.clone();
    let controller = OperationController::with_options(
        delayed_label(counter()),
        ControllerOptions::new().on_success(move |_: &String| {
            seen.fetch_add(1, Ordering::SeqCst);
        }),
    );

    let slow = controller.clone();
    let first = tokio::spawn(async move { slow.execute(("first", 100)).await });
    sleep(Duration::from_millis(5)).await;

    let second = controller.execute(("second", 10)).await;
    sleep(Duration::from_millis(200)).await;

    assert_eq!(first.await.unwrap(), Err(SlotError::Superseded));
    assert_eq!(second, Ok("second".to_string()));
    assert_eq!(controller.state().data.as_deref(), Some("second"));
    assert_eq!(successes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_call_wins_when_first_would_finish_first() {
    let controller = OperationController::new(delayed_label(counter()));

    let fast = controller.clone();
    let first = tokio::spawn(async move { fast.execute(("first", 20)).await });
    sleep(Duration::from_millis(5)).await;

    let second = controller.execute(("second", 50)).await;

    assert_eq!(first.await.unwrap(), Err(SlotError::Superseded));
    assert_eq!(second, Ok("second".to_string()));
    let state = controller.state();
    assert_eq!(state.data.as_deref(), Some("second"));
    assert!(state.success);
}

#[tokio::test(start_paused = true)]
async fn test_stale_failure_is_discarded() {
    let errors = counter();
    let seen = errors.clone();
    let controller = OperationController::with_options(
        |(fail, delay_ms): (bool, u64)| async move {
            sleep(Duration::from_millis(delay_ms)).await;
            if fail {
                Err(SlotError::operation("stale"))
            } else {
                Ok("fresh".to_string())
            }
        },
        ControllerOptions::new()
            .with_retry(RetryConfig::fixed(5, Duration::from_millis(1)))
            .on_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }),
    );

    let stale = controller.clone();
    let first = tokio::spawn(async move { stale.execute((true, 30)).await });
    sleep(Duration::from_millis(5)).await;
    controller.execute((false, 10)).await.unwrap();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(first.await.unwrap(), Err(SlotError::Superseded));
    assert_eq!(errors.load(Ordering::SeqCst), 0);
    assert_eq!(controller.retry_count(), 0);
    assert!(controller.state().success);
}

#[tokio::test]
async fn test_retry_without_prior_invocation_is_noop() {
    let calls = counter();
    let controller = OperationController::new(flaky_user(calls.clone(), 0));

    assert_eq!(controller.retry().await, Ok(None));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(controller.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn test_manual_retry_reuses_last_args() {
    let calls = counter();
    let controller = OperationController::new(flaky_user(calls.clone(), 1));

    assert!(controller.execute("7".to_string()).await.is_err());
    let value = controller.retry().await.unwrap();

    assert_eq!(value.as_deref(), Some("user:7"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(controller.state().success);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_waiting_but_keeps_outcome() {
    let controller = OperationController::new(delayed_label(counter()));
    controller.execute(("done", 1)).await.unwrap();

    let pending = controller.clone();
    let in_flight = tokio::spawn(async move { pending.execute(("late", 100)).await });
    sleep(Duration::from_millis(5)).await;
    assert!(controller.state().loading);

    controller.cancel();
    assert_eq!(in_flight.await.unwrap(), Err(SlotError::Cancelled));
    sleep(Duration::from_millis(200)).await;

    let state = controller.state();
    assert!(!state.loading);
    assert_eq!(state.data.as_deref(), Some("done"));
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_reset_returns_to_rest_and_drops_pending_retry() {
    let calls = counter();
    let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::unbounded());
    store.put("seeded", serde_json::json!("kept"), Instant::now());

    let controller = OperationController::with_options(
        flaky_user(calls.clone(), u32::MAX),
        ControllerOptions::new()
            .with_store(store.clone())
            .with_retry(RetryConfig::fixed(3, Duration::from_millis(100)))
            .with_initial_data("placeholder".to_string()),
    );

    assert!(controller.execute("7".to_string()).await.is_err());
    assert_eq!(controller.retry_count(), 1);

    controller.reset();
    sleep(Duration::from_secs(1)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.retry_count(), 0);
    assert_eq!(
        controller.state(),
        OperationState::at_rest(Some("placeholder".to_string()))
    );
    assert!(store.get("seeded").is_some());
}

#[tokio::test]
async fn test_subscribers_see_transitions() {
    let controller = OperationController::new(flaky_user(counter(), 0));
    let mut updates = controller.subscribe();

    controller.execute("3".to_string()).await.unwrap();

    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert_eq!(latest.data.as_deref(), Some("user:3"));
    assert!(latest.success);
}
