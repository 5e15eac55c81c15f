//! Core types for the online shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod identity;
pub mod price;
pub mod status;

pub use id::*;
pub use identity::CurrentUser;
pub use price::{MAX_AMOUNT, MAX_PRICE_SCALE, PriceError, line_total, order_total, validate_unit_price};
pub use status::*;
