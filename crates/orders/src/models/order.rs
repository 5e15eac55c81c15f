//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use online_shop_core::{LineItemId, OrderId, OrderStatus, ProductId, UserId};

/// Order header: one row per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Engine-generated order ID.
    pub id: OrderId,
    /// Buyer who placed the order.
    pub user_id: UserId,
    /// Shipping address reference.
    #[serde(rename = "shipping_address")]
    pub address_id: String,
    /// When the order was placed.
    pub order_date: DateTime<Utc>,
    /// When payment was received, if it has been.
    pub payment_date: Option<DateTime<Utc>>,
    /// When the order shipped, if it has.
    pub delivered_date: Option<DateTime<Utc>>,
    /// Current fulfillment status.
    pub status: OrderStatus,
    /// Sum of `price * quantity` over the line items, fixed at placement.
    pub amount: Decimal,
}

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineItem {
    pub id: LineItemId,
    pub order_id: OrderId,
    /// 1-based position of the line in the placement request.
    pub line_number: i32,
    pub product_id: ProductId,
    /// Unit price captured when the order was placed.
    pub price: Decimal,
    pub quantity: i32,
}

/// An order header together with all of its line items.
///
/// This is the unit written atomically by `OrderStore::place_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order: Order,
    pub items: Vec<OrderLineItem>,
}

/// One row of the order/line item/product join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedOrderRow {
    pub order: Order,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

/// Client-facing view of an order with resolved product names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub shipping_address: String,
    pub order_date: DateTime<Utc>,
    pub payment_date: Option<DateTime<Utc>>,
    pub delivered_date: Option<DateTime<Utc>>,
    pub items: Vec<ItemView>,
}

/// A line item as shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
}

impl OrderView {
    /// Build the view from the composed rows of a single order.
    ///
    /// Returns `None` when there are no rows. The join drops orders without
    /// line items, so "no such order" and "order with no items" look the same
    /// here; placement never commits the latter.
    #[must_use]
    pub fn compose(rows: Vec<ComposedOrderRow>) -> Option<Self> {
        let header = rows.first()?.order.clone();
        let items = rows
            .into_iter()
            .map(|row| ItemView {
                name: row.product_name,
                price: row.price,
                quantity: row.quantity,
            })
            .collect();

        Some(Self {
            id: header.id,
            user_id: header.user_id,
            status: header.status,
            amount: header.amount,
            shipping_address: header.address_id,
            order_date: header.order_date,
            payment_date: header.payment_date,
            delivered_date: header.delivered_date,
            items,
        })
    }
}

/// Request to place an order.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderInput {
    /// Shipping address reference.
    pub shipping_address: String,
    /// Ordered line items.
    pub items: Vec<LineItemInput>,
}

/// One requested line item.
///
/// The price is supplied by the caller and is not checked against the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemInput {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}

/// Request to move an order to a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
}
