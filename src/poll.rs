// ABOUTME: Fixed-interval polling until a check reports completion.
// ABOUTME: Supports an optional overall timeout; the check runs once before the first wait.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Why polling stopped without a result.
#[derive(Debug, thiserror::Error)]
pub enum PollError<E> {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Failed(E),
}

/// Run `check` now and then every `interval` until it yields a value.
///
/// `Ok(Some(v))` finishes with `v`, `Ok(None)` keeps waiting, and `Err(e)`
/// stops immediately. With a `timeout`, polling gives up after the first
/// unsuccessful check made once that much time has passed.
pub async fn poll<T, E, F, Fut>(
    interval: Duration,
    timeout: Option<Duration>,
    mut check: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if let Some(value) = check().await.map_err(PollError::Failed)? {
            return Ok(value);
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                tracing::debug!(attempt, "polling timed out");
                return Err(PollError::Timeout(limit));
            }
        }

        tracing::trace!(attempt, "condition not met, waiting");
        tokio::time::sleep(interval).await;
    }
}
