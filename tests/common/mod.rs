#![allow(dead_code)]

use std::sync::Arc;

use postdesk::{
    AppConfig, AppState, InMemoryRepository, PostPolicy, RepositoryState,
    auth::hash_password_with_cost,
    models::Credential,
    repository::Repository,
};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Lowest cost bcrypt accepts; keeps the suites fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Config pointing at the test secret with the given post policy.
pub fn test_config(policy: PostPolicy) -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        post_policy: policy,
        ..AppConfig::default()
    }
}

/// In-memory repository holding one `admin` credential, hashed at `TEST_BCRYPT_COST`.
pub async fn seeded_repo() -> (Arc<InMemoryRepository>, Credential) {
    let repo = Arc::new(InMemoryRepository::new());
    let hash = hash_password_with_cost(ADMIN_PASSWORD, TEST_BCRYPT_COST).unwrap();
    let credential = repo.insert_credential(ADMIN_USERNAME, &hash).await.unwrap();
    (repo, credential)
}

pub fn test_state(repo: Arc<InMemoryRepository>, policy: PostPolicy) -> AppState {
    AppState::new(repo as RepositoryState, &test_config(policy))
}
