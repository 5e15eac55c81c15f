//! HTTP route handlers for the orders service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (store reachable)
//!
//! # Orders (requires bearer token)
//! GET  /v1/orders/{id}         - Composed order view
//! POST /v1/orders              - Place an order (201)
//! PUT  /v1/orders              - Update an order's status
//! ```

pub mod orders;

use std::time::Duration;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::db::OrderStore;
use crate::middleware::{jwt_auth_middleware, request_id_middleware};
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes<S: OrderStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/v1/orders", post(orders::place).put(orders::update))
        .route("/v1/orders/{id}", get(orders::show))
}

/// Create the health check routes.
pub fn health_routes<S: OrderStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Build the complete application: routes, state and the middleware stack.
///
/// Bearer tokens are only resolved on the order routes, so health checks
/// answer regardless of the `Authorization` header.
pub fn app<S: OrderStore>(state: AppState<S>, request_timeout: Duration) -> Router {
    let verifier = state.verifier().clone();
    let orders = order_routes().route_layer(from_fn_with_state(verifier, jwt_auth_middleware));

    health_routes()
        .merge(orders)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the order store is not reachable.
async fn readiness<S: OrderStore>(State(state): State<AppState<S>>) -> StatusCode {
    match state.orders().store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
