//! Online shop order service library.
//!
//! Order placement, lookup and status updates over `PostgreSQL`, exposed as a
//! JSON HTTP API. The binary in `main.rs` wires this library to the
//! environment; tests drive the same router against an in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
