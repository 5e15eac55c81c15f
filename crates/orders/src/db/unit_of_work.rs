//! Transactional unit of work on the writer pool.
//!
//! ```rust,ignore
//! let mut uow = UnitOfWork::begin(&pool).await?;
//! let outcome = write_everything(uow.connection()).await;
//! uow.end(outcome).await?;
//! ```
//!
//! `end` commits when the outcome is `Ok` and rolls back otherwise. A unit of
//! work that is dropped without `end` (the request was cancelled or timed out)
//! is rolled back when sqlx returns its connection to the pool.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use thiserror::Error;

use super::RepositoryError;

/// Failures at the transaction boundary itself.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] sqlx::Error),

    /// The unit of work failed and rolling it back failed too.
    #[error("{cause}; rollback also failed: {rollback}")]
    RollbackFailed {
        #[source]
        cause: Box<RepositoryError>,
        rollback: sqlx::Error,
    },
}

/// An open repeatable-read transaction.
pub struct UnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork {
    /// Begin a transaction at `REPEATABLE READ` isolation.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::Begin` if no connection is available or the
    /// isolation level cannot be set.
    pub async fn begin(pool: &PgPool) -> Result<Self, TransactionError> {
        let mut tx = pool.begin().await.map_err(TransactionError::Begin)?;

        // Must be the first statement of the transaction.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(TransactionError::Begin)?;

        Ok(Self { tx })
    }

    /// The connection to run the unit's statements on.
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }

    /// Finish the unit of work according to `outcome`.
    ///
    /// # Errors
    ///
    /// On `Err`, rolls back and returns the original error (combined with the
    /// rollback failure, if any). On `Ok`, returns `TransactionError::Commit`
    /// if the commit fails.
    pub async fn end<T>(self, outcome: Result<T, RepositoryError>) -> Result<T, RepositoryError> {
        match outcome {
            Ok(value) => {
                self.tx.commit().await.map_err(TransactionError::Commit)?;
                Ok(value)
            }
            Err(cause) => Err(settle_rollback(cause, self.tx.rollback().await)),
        }
    }
}

/// Combine the error that caused a rollback with the rollback's own result.
fn settle_rollback(cause: RepositoryError, rollback: Result<(), sqlx::Error>) -> RepositoryError {
    match rollback {
        Ok(()) => cause,
        Err(rollback) => {
            tracing::warn!(error = %cause, rollback_error = %rollback, "Rollback failed");
            TransactionError::RollbackFailed {
                cause: Box::new(cause),
                rollback,
            }
            .into()
        }
    }
}
