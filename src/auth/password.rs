use std::sync::LazyLock;

use bcrypt::DEFAULT_COST;

use crate::{error::AppError, models::Credential, repository::RepositoryState};

/// Hash compared against when the username does not exist, so an unknown user
/// costs the same bcrypt work as a wrong password. Only ever touched on the
/// blocking pool.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("postdesk-unknown-user", DEFAULT_COST).ok());

/// prime_dummy_hash
///
/// Computes the unknown-user hash ahead of the first login. Called once at
/// startup so the first unknown-user attempt is not slower than a wrong password.
pub async fn prime_dummy_hash() -> Result<(), AppError> {
    let ready = tokio::task::spawn_blocking(|| LazyLock::force(&DUMMY_HASH).is_some())
        .await
        .map_err(|e| AppError::Internal(format!("dummy hash task failed: {e}")))?;

    if ready {
        Ok(())
    } else {
        Err(AppError::Internal("dummy hash could not be computed".to_string()))
    }
}

/// hash_password
///
/// Produces a salted bcrypt hash at the default cost. Used when seeding
/// credentials out-of-band.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    hash_password_with_cost(plain, DEFAULT_COST)
}

pub fn hash_password_with_cost(plain: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(plain, cost).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// CredentialVerifier
///
/// Checks a username/password pair against the stored bcrypt hash. Every
/// failure, whatever the cause, surfaces as `AppError::InvalidCredentials`.
pub struct CredentialVerifier {
    repo: RepositoryState,
}

impl CredentialVerifier {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// verify
    ///
    /// Read-only. Store failures propagate as `AppError::Store`; they are not
    /// authentication outcomes.
    pub async fn verify(&self, username: &str, password: &str) -> Result<Credential, AppError> {
        let credential = self.repo.find_credential(username).await?;

        let stored = credential.as_ref().map(|c| c.password_hash.clone());
        let matches = check_password(password.to_string(), stored).await?;

        match credential {
            Some(credential) if matches => {
                tracing::info!(user_id = credential.id, "credential verified");
                Ok(credential)
            }
            _ => {
                tracing::warn!("login rejected: invalid credentials");
                Err(AppError::InvalidCredentials)
            }
        }
    }
}

// bcrypt is slow, so it runs on the blocking pool rather than a runtime worker.
// `None` compares against the dummy hash.
async fn check_password(password: String, stored: Option<String>) -> Result<bool, AppError> {
    let outcome = tokio::task::spawn_blocking(move || {
        match stored.as_deref().or_else(|| DUMMY_HASH.as_deref()) {
            Some(hash) => bcrypt::verify(password, hash),
            None => Ok(false),
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            // A corrupt stored hash is an operator problem, but the caller still only
            // learns that the credentials were rejected.
            tracing::error!("stored password hash could not be parsed: {}", e);
            Ok(false)
        }
    }
}
