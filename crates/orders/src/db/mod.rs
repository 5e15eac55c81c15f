//! Database operations for orders `PostgreSQL`.
//!
//! ## Tables (schema `shop`)
//!
//! - `orders` - Order headers
//! - `order_detail` - Order line items
//! - `product` - Catalog products (read-only here, joined for display names)
//!
//! # Read/write split
//!
//! Writes always go to the primary ("writer") pool. Reads go to the replica
//! ("reader") pool unless the caller asks for [`Consistency::Strong`], in which
//! case they are served by the writer as well. A replica read issued right
//! after a write is not guaranteed to observe it.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/orders/migrations/` and run via:
//! ```bash
//! cargo run -p online-shop-cli -- migrate
//! ```

pub mod orders;
pub mod unit_of_work;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use online_shop_core::OrderId;

use crate::models::{ComposedOrderRow, NewOrder, Order, OrderLineItem};

pub use orders::PgOrderStore;
pub use unit_of_work::{TransactionError, UnitOfWork};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (duplicate key, missing reference, check).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Transaction begin/commit/rollback failed.
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),
}

/// Which connection a read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// Replica; may lag behind recent writes.
    Eventual,
    /// Primary; observes every committed write.
    Strong,
}

/// Persistence contract for orders and their line items.
///
/// Every method may block on database I/O. Dropping a returned future
/// abandons the call; an open transaction is rolled back.
pub trait OrderStore: Send + Sync + 'static {
    /// Fetch an order header.
    ///
    /// Returns `RepositoryError::NotFound` if there is no such order.
    fn get(
        &self,
        id: OrderId,
        consistency: Consistency,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// Fetch the order/line item/product join, one row per line item.
    ///
    /// Returns an empty vector if there is no such order.
    fn get_composed(
        &self,
        id: OrderId,
        consistency: Consistency,
    ) -> impl Future<Output = Result<Vec<ComposedOrderRow>, RepositoryError>> + Send;

    /// Insert an order header.
    fn create_order(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert one line item.
    fn create_order_detail(
        &self,
        item: &OrderLineItem,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite the mutable header fields (address, payment date, delivered
    /// date, status) keyed by order ID.
    ///
    /// Matching no row is not an error.
    fn update_order(&self, order: &Order)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Insert a header and all of its line items in one unit of work.
    ///
    /// Either everything is committed or nothing is.
    fn place_order(
        &self,
        new_order: &NewOrder,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Check that the store can serve requests.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Map a failed write to a repository error.
///
/// Constraint violations become `RepositoryError::Conflict`; everything else is
/// passed through as `RepositoryError::Database`.
pub(crate) fn write_error(what: &str, err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(format!("{what} already exists"));
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict(format!("{what} references a missing row"));
        }
        if db_err.is_check_violation() {
            return RepositoryError::Conflict(format!("{what} violates a check constraint"));
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = write_error("order", sqlx::Error::PoolTimedOut);
        assert!(matches!(
            err,
            RepositoryError::Database(sqlx::Error::PoolTimedOut)
        ));
    }

    #[test]
    fn test_repository_error_display() {
        assert_eq!(RepositoryError::NotFound.to_string(), "not found");
        assert_eq!(
            RepositoryError::Conflict("order already exists".to_string()).to_string(),
            "constraint violation: order already exists"
        );
    }
}
