use crate::{AppState, handlers, require_session};
use axum::{
    Router, middleware,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Write access to posts. `require_session` wraps each method handler rather
/// than the router, so unsupported methods on these paths still answer 405.
/// Handlers additionally take `AdminSession`, which reads the claims that
/// layer attached.
pub fn authenticated_routes(state: AppState) -> Router<AppState> {
    let session = middleware::from_fn_with_state(state, require_session);

    Router::<AppState>::new()
        // POST /posts
        .route(
            "/posts",
            post(handlers::create_post).route_layer(session.clone()),
        )
        // PUT/DELETE /posts/{id}
        // Delete semantics (soft or hard) come from the deployment's post policy.
        .route(
            "/posts/{id}",
            put(handlers::update_post)
                .delete(handlers::delete_post)
                .route_layer(session),
        )
}
