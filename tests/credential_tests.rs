mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{ADMIN_PASSWORD, ADMIN_USERNAME, seeded_repo};
use postdesk::{
    AppError, InMemoryRepository, RepositoryState,
    auth::{CredentialVerifier, hash_password, prime_dummy_hash},
    error::INVALID_CREDENTIALS_MESSAGE,
    repository::Repository,
};
use tokio::test;

#[test]
async fn test_verify_success_returns_stored_credential() {
    let (repo, credential) = seeded_repo().await;
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    let verified = verifier.verify(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap();

    assert_eq!(verified.id, credential.id);
    assert_eq!(verified.username, ADMIN_USERNAME);
}

#[test]
async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
    let (repo, _) = seeded_repo().await;
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    let wrong_password = verifier.verify(ADMIN_USERNAME, "wrong").await.unwrap_err();
    let unknown_user = verifier.verify("nobody", "wrong").await.unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_user, AppError::InvalidCredentials));
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status(), unknown_user.status());
    assert_eq!(wrong_password.public_message(), unknown_user.public_message());
    assert_eq!(wrong_password.public_message(), INVALID_CREDENTIALS_MESSAGE);
}

#[test]
async fn test_username_match_is_exact() {
    let (repo, _) = seeded_repo().await;
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    let result = verifier.verify("Admin", ADMIN_PASSWORD).await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[test]
async fn test_corrupt_stored_hash_is_a_rejection() {
    let repo = Arc::new(InMemoryRepository::new());
    repo.insert_credential("legacy", ADMIN_PASSWORD).await.unwrap();
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    // The stored value is plaintext, not a bcrypt hash; it must never match.
    let result = verifier.verify("legacy", ADMIN_PASSWORD).await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[test]
async fn test_store_failure_is_not_reported_as_bad_credentials() {
    let (repo, _) = seeded_repo().await;
    repo.set_failing(true);
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    let err = verifier.verify(ADMIN_USERNAME, ADMIN_PASSWORD).await.unwrap_err();

    assert!(matches!(err, AppError::Store(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
async fn test_hash_password_is_salted_bcrypt() {
    let first = hash_password(ADMIN_PASSWORD).unwrap();
    let second = hash_password(ADMIN_PASSWORD).unwrap();

    assert!(first.starts_with("$2"));
    assert!(!first.contains(ADMIN_PASSWORD));
    assert_ne!(first, second, "two hashes of one password must differ by salt");
    assert!(bcrypt::verify(ADMIN_PASSWORD, &first).unwrap());
}

#[test]
async fn test_primed_dummy_hash_never_admits_unknown_user() {
    prime_dummy_hash().await.unwrap();
    let (repo, _) = seeded_repo().await;
    let verifier = CredentialVerifier::new(repo as RepositoryState);

    // Even the plaintext behind the dummy hash is rejected without a stored credential.
    let result = verifier.verify("nobody", "postdesk-unknown-user").await;

    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}
