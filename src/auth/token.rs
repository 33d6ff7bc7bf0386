use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};

use crate::{error::AppError, models::Credential};

/// Lifetime of a session token.
pub const SESSION_TTL_HOURS: i64 = 24;

/// Algorithm used to sign new tokens.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// HMAC algorithms a presented token may assert. Anything else, including
/// asymmetric algorithms and `none`, is rejected before signature checking.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// SessionClaims
///
/// The typed identity carried by a session token and attached to every
/// authorized request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// `Credential.id` of the authenticated administrator.
    pub subject: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TokenClaims
///
/// Wire form of `SessionClaims` inside the JWT. `sub` is a string as RFC 7519
/// requires; `iat`/`exp` are Unix seconds.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl TryFrom<TokenClaims> for SessionClaims {
    type Error = AppError;

    fn try_from(claims: TokenClaims) -> Result<Self, Self::Error> {
        let subject = claims.sub.parse().map_err(|_| AppError::Unauthenticated)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AppError::Unauthenticated)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AppError::Unauthenticated)?;
        Ok(SessionClaims {
            subject,
            issued_at,
            expires_at,
        })
    }
}

/// TokenIssuer
///
/// Signs session tokens for verified credentials.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn issue(&self, credential: &Credential) -> Result<String, AppError> {
        self.issue_at(credential, Utc::now())
    }

    /// issue_at
    ///
    /// Issues a token as if the current time were `now`. A signing failure is an
    /// internal error; an unsigned or empty token is never returned.
    pub fn issue_at(&self, credential: &Credential, now: DateTime<Utc>) -> Result<String, AppError> {
        let claims = TokenClaims {
            sub: credential.id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))?;

        if token.is_empty() {
            return Err(AppError::Internal("token signing produced no output".to_string()));
        }
        Ok(token)
    }
}

/// TokenVerifier
///
/// Checks algorithm, signature and expiry of a presented token.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = true;
        // An expired token is expired; no grace period.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        match decode::<TokenClaims>(token, &self.key, &self.validation) {
            Ok(data) => data.claims.try_into(),
            Err(e) => {
                // The reason is for the server log only; the client sees a uniform 401.
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("token rejected: expired"),
                    ErrorKind::InvalidAlgorithm => {
                        tracing::warn!("token rejected: unexpected signing algorithm")
                    }
                    ErrorKind::InvalidSignature => tracing::warn!("token rejected: bad signature"),
                    other => tracing::debug!("token rejected: {:?}", other),
                }
                Err(AppError::Unauthenticated)
            }
        }
    }
}
