//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::OrderStore;
use crate::middleware::JwtVerifier;
use crate::services::OrderService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It is generic over the order
/// store so the same router runs against `PostgreSQL` in production and an
/// in-memory store in tests.
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    orders: OrderService<S>,
    verifier: JwtVerifier,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OrderStore> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Order store the service reads from and writes to
    /// * `verifier` - Bearer token verifier
    #[must_use]
    pub fn new(store: S, verifier: JwtVerifier) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                orders: OrderService::new(store),
                verifier,
            }),
        }
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService<S> {
        &self.inner.orders
    }

    /// Get a reference to the bearer token verifier.
    #[must_use]
    pub fn verifier(&self) -> &JwtVerifier {
        &self.inner.verifier
    }
}
