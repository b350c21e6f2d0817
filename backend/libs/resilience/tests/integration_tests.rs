/// Integration tests for resilience library
use resilience::{with_retry, with_retry_if, RetryConfig, RetryError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, PartialEq)]
enum WriteError {
    PoolTimedOut,
    NotFound,
}

impl std::fmt::Display for WriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::PoolTimedOut => f.write_str("pool timed out"),
            WriteError::NotFound => f.write_str("row not found"),
        }
    }
}

fn is_transient(e: &WriteError) -> bool {
    matches!(e, WriteError::PoolTimedOut)
}

#[tokio::test]
async fn test_store_write_recovers_from_pool_timeouts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result = with_retry_if(RetryConfig::store_writes(2), is_transient, move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(WriteError::PoolTimedOut)
            } else {
                Ok("updated")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "updated");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_store_write_gives_up_on_missing_row() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();

    let result = with_retry_if(RetryConfig::store_writes(3), is_transient, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(WriteError::NotFound) }
    })
    .await;

    assert_eq!(result.unwrap_err().into_inner(), WriteError::NotFound);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_exponential_backoff_timing() {
    let config = RetryConfig {
        max_retries: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let start = Instant::now();
    let result = with_retry(config, || async { Err::<(), _>("always fails") }).await;
    let elapsed = start.elapsed();

    // 10 + 20 + 40 ms of backoff before the final attempt
    assert!(elapsed >= Duration::from_millis(70));
    assert!(matches!(
        result,
        Err(RetryError::Exhausted { attempts: 4, .. })
    ));
}
