//! Database query timeout helpers
//!
//! Bounds every storage round trip so a stalled database surfaces as a
//! persistence failure instead of hanging a recompute.

use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for database queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for timeout operations
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    /// Operation timed out
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for timeout operations
pub type TimeoutResult<T> = Result<T, TimeoutError>;

/// Execute a query with timeout
///
/// # Example
///
/// ```no_run
/// use league_standings::db::timeouts::{with_timeout, DEFAULT_QUERY_TIMEOUT};
/// # use sqlx::PgPool;
/// # async fn example(pool: &PgPool) -> Result<(), Box<dyn std::error::Error>> {
///
/// let result = with_timeout(
///     DEFAULT_QUERY_TIMEOUT,
///     sqlx::query("SELECT * FROM event_teams WHERE event_id = $1")
///         .bind(1)
///         .fetch_all(pool)
/// ).await?;
///
/// # Ok(())
/// # }
/// ```
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> TimeoutResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Database(e)),
        Err(_) => Err(TimeoutError::Timeout(duration)),
    }
}

/// Execute a query with default timeout (5 seconds)
pub async fn with_default_timeout<F, T>(future: F) -> TimeoutResult<T>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    with_timeout(DEFAULT_QUERY_TIMEOUT, future).await
}

/// Bound a multi-statement transaction (10 seconds)
///
/// Unlike [`with_timeout`] the future may fail with any error that can also
/// represent a timeout, so domain errors raised inside the transaction pass
/// through unchanged. Dropping the future on timeout drops the transaction,
/// which rolls it back.
pub async fn with_transaction_timeout<F, T, E>(future: F) -> Result<T, E>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: From<TimeoutError>,
{
    match timeout(DEFAULT_TRANSACTION_TIMEOUT, future).await {
        Ok(result) => result,
        Err(_) => Err(TimeoutError::Timeout(DEFAULT_TRANSACTION_TIMEOUT).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_constants() {
        assert_eq!(DEFAULT_QUERY_TIMEOUT.as_secs(), 5);
        assert_eq!(DEFAULT_TRANSACTION_TIMEOUT.as_secs(), 10);
    }

    #[tokio::test]
    async fn test_timeout_error_display() {
        let err = TimeoutError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("5s"));
    }

    #[tokio::test]
    async fn test_with_timeout_elapses() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, sqlx::Error>(1)
        };
        let result = with_timeout(Duration::from_millis(10), slow).await;
        assert!(matches!(result, Err(TimeoutError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_database_errors() {
        let failing = async { Err::<i32, _>(sqlx::Error::RowNotFound) };
        let result = with_default_timeout(failing).await;
        assert!(matches!(result, Err(TimeoutError::Database(_))));
    }

    #[tokio::test]
    async fn test_transaction_timeout_keeps_inner_error() {
        let result: Result<i32, TimeoutError> =
            with_transaction_timeout(async { Err(TimeoutError::Database(sqlx::Error::PoolClosed)) })
                .await;
        assert!(matches!(result, Err(TimeoutError::Database(_))));
    }
}
