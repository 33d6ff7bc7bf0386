use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use crate::error::AppError;

pub mod password;
pub mod token;

pub use password::{CredentialVerifier, hash_password, hash_password_with_cost, prime_dummy_hash};
pub use token::{SESSION_TTL_HOURS, SessionClaims, TokenClaims, TokenIssuer, TokenVerifier};

/// The only accepted authorization scheme.
pub const BEARER_SCHEME: &str = "Bearer";

/// AccessGate
///
/// Decides whether a protected request may proceed. Runs, in order:
/// 1. Header presence: a missing or empty `Authorization` header is rejected.
/// 2. Header shape: exactly two whitespace-separated parts, the first being `Bearer`.
/// 3. Signature: the token must assert an HMAC algorithm and verify against the secret.
/// 4. Expiry: `exp` must not be in the past.
///
/// Every rejection is the same `AppError::Unauthenticated`; callers cannot tell
/// which step failed.
pub struct AccessGate {
    verifier: TokenVerifier,
}

/// GateState
///
/// The concrete type used to share the gate across the application state.
pub type GateState = Arc<AccessGate>;

impl AccessGate {
    pub fn new(secret: &str) -> Self {
        Self {
            verifier: TokenVerifier::new(secret),
        }
    }

    pub fn authorize(&self, raw_header: Option<&str>) -> Result<SessionClaims, AppError> {
        let raw = raw_header
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or(AppError::Unauthenticated)?;

        let mut parts = raw.split_whitespace();
        let token = match (parts.next(), parts.next(), parts.next()) {
            (Some(BEARER_SCHEME), Some(token), None) => token,
            _ => return Err(AppError::Unauthenticated),
        };

        self.verifier.verify(token)
    }
}

/// AdminSession Extractor Result
///
/// The resolved session of an authorized request. Handlers on protected routes
/// take this as an argument to learn who is acting.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

/// AdminSession Extractor Implementation
///
/// Reuses claims already attached to the request by `require_session`;
/// otherwise runs the `AccessGate` against the `Authorization` header.
///
/// Rejection: `AppError::Unauthenticated` (401) on any failure.
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    GateState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(AdminSession(claims.clone()));
        }

        let gate = GateState::from_ref(state);

        // A header that is not valid visible ASCII is treated like a missing one.
        let raw_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let claims = gate.authorize(raw_header)?;
        Ok(AdminSession(claims))
    }
}
