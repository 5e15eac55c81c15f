//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Order placement, lookup and status updates

pub mod orders;

pub use orders::{OrderError, OrderService};
