//! Retry policy for store reads.
//!
//! Reads are retried once when the failure looks transient (a dropped
//! connection or an exhausted pool). Writes are never retried here: a retried
//! insert could double-assign a sequence number or re-submit a rating.

use std::future::Future;
use std::time::Duration;

use informes_common::{AppError, AppResult};
use sea_orm::DbErr;
use tracing::warn;

const RETRY_DELAY: Duration = Duration::from_millis(50);

/// Whether a store error is worth a second attempt.
#[must_use]
pub const fn is_transient(err: &DbErr) -> bool {
    matches!(err, DbErr::Conn(_) | DbErr::ConnectionAcquire(_))
}

/// Run a read, retrying once on a transient failure.
pub async fn read_with_retry<T, F, Fut>(operation: &'static str, mut f: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    match f().await {
        Ok(value) => Ok(value),
        Err(e) if is_transient(&e) => {
            warn!(operation, error = %e, "Transient store error, retrying once");
            tokio::time::sleep(RETRY_DELAY).await;
            f().await.map_err(|e| AppError::Database(e.to_string()))
        }
        Err(e) => Err(AppError::Database(e.to_string())),
    }
}
