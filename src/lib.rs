use std::sync::Arc;

use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod posts;
pub mod repository;

// Routing segregated by access level (public, authenticated).
pub mod routes;
use routes::{authenticated, public};

use auth::{AccessGate, AdminSession, GateState, TokenIssuer};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, StoreError};
pub use policy::PostPolicy;
pub use posts::PostStore;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for every routed handler, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::login, handlers::list_posts, handlers::get_post,
        handlers::create_post, handlers::update_post, handlers::delete_post
    ),
    components(
        schemas(
            models::Post, models::PostStatus, models::PostInput, models::LoginRequest,
            models::LoginResponse, models::MessageResponse, models::PostListResponse,
            models::PostResponse, error::ErrorBody,
        )
    ),
    tags(
        (name = "postdesk", description = "Post management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, shared by every handler. Nothing in here is
/// mutated after startup; the repository is the only component with state.
#[derive(Clone)]
pub struct AppState {
    /// Persistence port (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Content store bound to `repo` and the configured post policy.
    pub posts: PostStore,
    /// Signs session tokens after a successful login.
    pub issuer: Arc<TokenIssuer>,
    /// Validates session tokens on protected routes.
    pub gate: GateState,
}

impl AppState {
    /// Wires every component from a repository and a loaded configuration.
    pub fn new(repo: RepositoryState, config: &AppConfig) -> Self {
        Self {
            posts: PostStore::new(repo.clone(), config.post_policy),
            issuer: Arc::new(TokenIssuer::new(&config.jwt_secret)),
            gate: Arc::new(AccessGate::new(&config.jwt_secret)),
            repo,
        }
    }
}

// --- Axum FromRef Extractor Implementation ---

impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

/// require_session
///
/// Middleware guarding each handler in `authenticated_routes`. Extracting `AdminSession` runs the
/// `AccessGate`; on failure the request is answered with 401 and no handler runs.
/// On success the claims are attached to the request extensions.
pub async fn require_session(
    AdminSession(claims): AdminSession,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(claims);
    next.run(request).await
}

/// create_router
///
/// Assembles routes, the session layer, observability layers and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes(state.clone()))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
