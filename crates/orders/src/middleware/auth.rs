//! Bearer token authentication.
//!
//! [`jwt_auth_middleware`] verifies an `Authorization: Bearer <jwt>` header and
//! stores the resulting [`CurrentUser`] in the request extensions. Requests
//! without the header pass through anonymously; a header that does not verify
//! is rejected with 401. Handlers that need an identity take [`RequireAuth`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use online_shop_core::CurrentUser;

use crate::error::{AppError, set_sentry_user};

/// Claims carried by a shop identity token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: String,
    /// Username
    pub name: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: u64,
}

/// Verifies HS256 identity tokens.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier for tokens signed with `signing_key`.
    #[must_use]
    pub fn new(signing_key: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(signing_key.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and return the user it identifies.
    ///
    /// # Errors
    ///
    /// Returns the `jsonwebtoken` error if the signature, algorithm or expiry
    /// does not check out.
    pub fn verify(&self, token: &str) -> Result<CurrentUser, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(CurrentUser::new(data.claims.id, data.claims.name))
    }
}

/// Middleware that resolves the bearer token, if any, into a `CurrentUser`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` when an `Authorization` header is present
/// but is not a valid bearer token.
pub async fn jwt_auth_middleware(
    State(verifier): State<JwtVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = request.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(request).await);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization format".to_string()))?;

    let user = verifier.verify(token).map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;

        set_sentry_user(&user.id, &user.username);
        Ok(Self(user))
    }
}
