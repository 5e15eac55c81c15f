//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
};

use online_shop_core::OrderId;

use crate::db::OrderStore;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderView, PlaceOrderInput, StatusUpdate};
use crate::state::AppState;

/// Show the composed view of an order.
pub async fn show<S: OrderStore>(
    State(state): State<AppState<S>>,
    RequireAuth(_user): RequireAuth,
    id: std::result::Result<Path<OrderId>, PathRejection>,
) -> Result<Json<OrderView>> {
    let Path(order_id) = id.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let view = state.orders().get(order_id).await?;
    Ok(Json(view))
}

/// Place an order for the authenticated user.
pub async fn place<S: OrderStore>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    payload: std::result::Result<Json<PlaceOrderInput>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let Json(input) = payload.inspect_err(|e| {
        tracing::info!(error = %e, "Unreadable order request");
    })?;
    let view = state.orders().place_order(&user, input).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Move an order to a new status and return the updated header.
pub async fn update<S: OrderStore>(
    State(state): State<AppState<S>>,
    RequireAuth(_user): RequireAuth,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(update) = payload.inspect_err(|e| {
        tracing::info!(error = %e, "Unreadable status update");
    })?;
    let order = state.orders().update_order(update).await?;
    Ok(Json(order))
}
