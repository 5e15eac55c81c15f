//! HTTP middleware stack for the orders service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span)
//! 4. `TimeoutLayer` (abandon slow requests with 408)
//! 5. JWT auth (resolve bearer token into `CurrentUser`; order routes only)

pub mod auth;
pub mod request_id;

pub use auth::{Claims, JwtVerifier, RequireAuth, jwt_auth_middleware};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
