//! Online Shop Core - Shared order types.
//!
//! This crate provides the types shared by every online-shop component:
//! - `orders` - Order placement and status service
//! - `cli` - Command-line tools for migrations
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, order status, money arithmetic and the current user identity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
