//! Deadline enforcement for the Coordinator and Store round trips.
//!
//! `dedup-coordinator` wraps every `claim`/`release` call in
//! `with_timeout(self.call_timeout, ...)` with the inner future already
//! returning `Result<T, redis::RedisError>` — `with_timeout` leaves that
//! inner `Result` untouched so the caller can still branch on the
//! original Redis error after the deadline check passes. `dedup-store`
//! does the same around its `INSERT`, needing to keep the `sqlx::Error`
//! intact long enough to read its SQLSTATE code (see `dedup-store`'s
//! unique-violation classification). Neither collaborator can afford to
//! lose that type information, which is why this module only offers the
//! type-preserving form — a `with_timeout_result` that collapsed the
//! inner error through `Display` existed in an earlier pass and was
//! removed once neither collaborator turned out to need it.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    #[error("Operation timed out after {0:?}")]
    Elapsed(Duration),
}

/// Race `future` against `duration`; the inner `Future::Output` (often
/// itself a `Result`) is returned untouched on success.
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    timeout(duration, future)
        .await
        .map_err(|_| TimeoutError::Elapsed(duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_timeout_elapsed() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            42
        })
        .await;

        assert!(result.is_err());
        assert!(matches!(result, Err(TimeoutError::Elapsed(_))));
    }

    /// Mirrors `dedup-coordinator::claim`: the inner future resolves to a
    /// `Result` of its own, and that inner `Result` must survive the
    /// deadline check untouched so the caller can still read the original
    /// error variant.
    #[tokio::test]
    async fn inner_result_is_not_collapsed_on_success() {
        let result: Result<Result<i32, &str>, TimeoutError> =
            with_timeout(Duration::from_secs(1), async { Err("unique violation") }).await;

        assert_eq!(result.unwrap(), Err("unique violation"));
    }
}
