//! Order service.
//!
//! Places orders, reads them back as composed views, and moves them through
//! their fulfillment statuses. The store is injected at construction and the
//! acting user is passed to each call that needs one.

mod error;

pub use error::OrderError;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;

use online_shop_core::{
    CurrentUser, LineItemId, OrderId, OrderStatus, PriceError, order_total, validate_unit_price,
};

use crate::db::{Consistency, OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderLineItem, OrderView, PlaceOrderInput, StatusUpdate};

/// Order placement and status service.
pub struct OrderService<S> {
    store: S,
}

impl<S: OrderStore> OrderService<S> {
    /// Create a new order service over `store`.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Get the composed view of an order.
    ///
    /// Served from the replica, so an order placed a moment ago may not be
    /// visible yet.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist (or has no
    /// line items). Store failures are returned as `OrderError::Repository`.
    pub async fn get(&self, order_id: OrderId) -> Result<OrderView, OrderError> {
        let rows = self
            .store
            .get_composed(order_id, Consistency::Eventual)
            .await?;
        OrderView::compose(rows).ok_or(OrderError::NotFound(order_id))
    }

    /// Place an order for `user`.
    ///
    /// The header and every line item are written in one unit of work; on
    /// success the composed view is read back from the primary.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for a malformed request and
    /// `OrderError::Unauthorized` for a blank user ID, both before touching the
    /// store. Store failures are returned as `OrderError::Repository`.
    pub async fn place_order(
        &self,
        user: &CurrentUser,
        input: PlaceOrderInput,
    ) -> Result<OrderView, OrderError> {
        let new_order = build_new_order(user, input, stored_now()).inspect_err(|e| {
            tracing::debug!(error = %e, user_id = %user.id, "Rejected order placement");
        })?;
        let order_id = new_order.order.id;

        self.store.place_order(&new_order).await?;

        tracing::info!(
            order_id = %order_id,
            user_id = %new_order.order.user_id,
            items = new_order.items.len(),
            amount = %new_order.order.amount,
            "Order placed"
        );

        let rows = self
            .store
            .get_composed(order_id, Consistency::Strong)
            .await?;
        OrderView::compose(rows).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("placed order {order_id} has no line items"))
                .into()
        })
    }

    /// Move an order to a new status and return the updated header.
    ///
    /// Any status may be written at any time and the last write wins. Moves
    /// outside the regular flow are logged, not rejected.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist. Store
    /// failures are returned as `OrderError::Repository`.
    pub async fn update_order(&self, update: StatusUpdate) -> Result<Order, OrderError> {
        let mut order = self
            .store
            .get(update.order_id, Consistency::Strong)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => OrderError::NotFound(update.order_id),
                other => OrderError::Repository(other),
            })?;

        let previous = order.status;
        if previous != update.status && !previous.can_advance_to(update.status) {
            tracing::warn!(
                order_id = %order.id,
                from = %previous,
                to = %update.status,
                "Irregular order status transition"
            );
        }

        apply_status(&mut order, update.status, stored_now());
        self.store.update_order(&order).await?;

        tracing::info!(
            order_id = %order.id,
            from = %previous,
            to = %order.status,
            "Order status updated"
        );

        Ok(order)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate a placement request and turn it into an order ready to persist.
fn build_new_order(
    user: &CurrentUser,
    input: PlaceOrderInput,
    now: DateTime<Utc>,
) -> Result<NewOrder, OrderError> {
    let amount = validate_placement(&input)?;

    if user.id.is_blank() {
        return Err(OrderError::Unauthorized);
    }

    let order_id = OrderId::generate();
    let items = input
        .items
        .into_iter()
        .zip(1..)
        .map(|(item, line_number)| OrderLineItem {
            id: LineItemId::generate(),
            order_id,
            line_number,
            product_id: item.product_id,
            price: item.price,
            quantity: item.quantity,
        })
        .collect();

    Ok(NewOrder {
        order: Order {
            id: order_id,
            user_id: user.id.clone(),
            address_id: input.shipping_address,
            order_date: now,
            payment_date: None,
            delivered_date: None,
            status: OrderStatus::Created,
            amount,
        },
        items,
    })
}

/// Check a placement request and compute its total.
fn validate_placement(input: &PlaceOrderInput) -> Result<Decimal, OrderError> {
    if input.shipping_address.trim().is_empty() {
        return Err(OrderError::Validation(
            "shipping address is required".to_string(),
        ));
    }
    if input.items.is_empty() {
        return Err(OrderError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    if i32::try_from(input.items.len()).is_err() {
        return Err(OrderError::Validation("too many items".to_string()));
    }

    for (index, item) in input.items.iter().enumerate() {
        validate_unit_price(item.price).map_err(|e| item_error(index, &e))?;
        if item.quantity < 1 {
            return Err(item_error(
                index,
                &PriceError::NonPositiveQuantity(item.quantity),
            ));
        }
    }

    order_total(input.items.iter().map(|item| (item.price, item.quantity)))
        .map_err(|e| OrderError::Validation(e.to_string()))
}

/// Current time at the precision `TIMESTAMPTZ` keeps (microseconds).
///
/// Returned headers must compare equal to what a later read yields.
fn stored_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn item_error(index: usize, err: &PriceError) -> OrderError {
    OrderError::Validation(format!("item {}: {err}", index + 1))
}

/// Overwrite the status, stamping the payment or delivery date it implies.
///
/// Repeating a stamping status stamps again.
fn apply_status(order: &mut Order, status: OrderStatus, now: DateTime<Utc>) {
    if status.stamps_payment() {
        order.payment_date = Some(now);
    }
    if status.stamps_delivery() {
        order.delivered_date = Some(now);
    }
    order.status = status;
}
