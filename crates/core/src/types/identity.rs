//! The authenticated principal behind a request.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The user on whose behalf a request is made.
///
/// Resolved from the request's bearer token at the HTTP boundary and passed
/// explicitly into the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Opaque user ID.
    pub id: UserId,
    /// Display name from the token.
    pub username: String,
}

impl CurrentUser {
    /// Create a new current-user identity.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
        }
    }
}
