//! Domain models for orders.
//!
//! These types are validated domain objects, separate from database row types
//! (which live next to their queries in [`crate::db`]).

pub mod order;

pub use order::{
    ComposedOrderRow, ItemView, LineItemInput, NewOrder, Order, OrderLineItem, OrderView,
    PlaceOrderInput, StatusUpdate,
};
