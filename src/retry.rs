// ABOUTME: Bounded retry helper for transient infrastructure failures.
// ABOUTME: Attempts are 1 + max_retries with exponential backoff between them.

use crate::config::RetryConfig;
use std::future::Future;

/// Run an async operation, retrying while `is_transient` approves and the
/// policy bound is not exhausted. The final error is returned unchanged.
pub async fn with_retries<T, E, F, Fut>(
    what: &str,
    retry: &RetryConfig,
    is_transient: fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && attempt < retry.max_retries => {
                let delay = retry.delay_for(attempt);
                attempt += 1;
                tracing::warn!(
                    "{} failed ({}), retry {}/{} in {:?}",
                    what,
                    e,
                    attempt,
                    retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
