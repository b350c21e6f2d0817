/// Resilience patterns shared by backend services
///
/// Currently provides bounded retry with exponential backoff and jitter for
/// transient failures. Callers decide which errors are transient and which
/// operations are safe to repeat.
///
/// # Example: Idempotent store write
///
/// ```rust,no_run
/// use resilience::{with_retry_if, RetryConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let result = with_retry_if(
///         RetryConfig::store_writes(2),
///         |e: &String| e.contains("timeout"),
///         || async {
///             // UPDATE ... WHERE id = $1
///             Ok::<_, String>(())
///         },
///     )
///     .await;
///     assert!(result.is_ok());
/// }
/// ```

pub mod retry;

pub use retry::{with_retry, with_retry_if, RetryConfig, RetryError};
