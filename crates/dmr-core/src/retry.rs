//! One bounded retry on a platform rate-limit signal.

use std::future::Future;

use tokio::time::sleep;
use tracing::warn;

use crate::Result;

/// Extra attempts allowed after the first one.
///
/// Exactly one: no backoff, no jitter. A second rate limit is handed back to the caller.
pub const MAX_RETRIES: usize = 1;

/// Run `op`; if it reports `RateLimited { retry_after }`, sleep for exactly that long and run it
/// one more time. Every other outcome (and a second rate limit) is returned unchanged.
///
/// `operation` only labels the log line.
pub async fn with_retry<T, F, Fut>(operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match e.retry_after() {
                Some(wait) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    warn!(
                        operation,
                        attempt = attempts + 1,
                        retry_after_secs = wait.as_secs_f64(),
                        "rate limited, waiting before retry"
                    );
                    sleep(wait).await;
                    continue;
                }
                _ => return Err(e),
            },
        }
    }
}
