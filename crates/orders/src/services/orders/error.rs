//! Order service error types.

use thiserror::Error;

use online_shop_core::OrderId;

use crate::db::RepositoryError;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed or missing request fields. Raised before any store access.
    #[error("invalid order: {0}")]
    Validation(String),

    /// No authenticated user.
    #[error("authentication required")]
    Unauthorized,

    /// No order (with line items) has this ID.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// Repository/database error, passed through unchanged.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
