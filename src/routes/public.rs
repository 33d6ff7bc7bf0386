use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session: the login exchange and read-only
/// access to live posts.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Load balancer / orchestrator liveness probe.
        .route("/health", get(|| async { "ok" }))
        // GET /
        .route("/", get(handlers::index))
        // POST /login
        // Verifies credentials and issues a session token.
        .route("/login", post(handlers::login))
        // GET /posts
        // Live posts, newest first.
        .route("/posts", get(handlers::list_posts))
        // GET /posts/{id}
        .route("/posts/{id}", get(handlers::get_post))
}
