use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{
    AppState,
    auth::{AdminSession, CredentialVerifier},
    error::{AppError, ErrorBody},
    models::{
        LoginRequest, LoginResponse, MessageResponse, PostInput, PostListResponse, PostResponse,
    },
};

// --- Public Handlers ---

/// login
///
/// [Public Route] Exchanges a username/password pair for a 24 hour session token.
/// Unknown usernames and wrong passwords produce the same 401 body.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(request) = payload?;

    let verifier = CredentialVerifier::new(state.repo.clone());
    let credential = verifier.verify(&request.username, &request.password).await?;
    let token = state.issuer.issue(&credential)?;

    Ok(Json(LoginResponse {
        token,
        message: "login successful".to_string(),
    }))
}

/// index
///
/// [Public Route] Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Server is running", body = MessageResponse))
)]
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Server is running!".to_string(),
    })
}

/// list_posts
///
/// [Public Route] All live posts, newest first. Tombstoned posts never appear.
#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "Posts", body = PostListResponse),
        (status = 500, description = "Store error", body = ErrorBody)
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<PostListResponse>, AppError> {
    let posts = state.posts.list().await?;
    Ok(Json(PostListResponse {
        count: posts.len(),
        data: posts,
    }))
}

/// get_post
///
/// [Public Route] A single live post.
#[utoipa::path(
    get,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostResponse),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<PostResponse>, AppError> {
    let Path(id) = id?;
    let post = state.posts.get(id).await?;
    Ok(Json(PostResponse { data: post }))
}

// --- Protected Handlers ---

/// create_post
///
/// [Authenticated Route] Creates a post. The stored status is decided by the
/// deployment's post policy, not only by the request.
#[utoipa::path(
    post,
    path = "/posts",
    request_body = PostInput,
    responses(
        (status = 201, description = "Created", body = PostResponse),
        (status = 400, description = "Missing required field", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn create_post(
    _session: AdminSession,
    State(state): State<AppState>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let Json(input) = payload?;
    let post = state.posts.create(input).await?;
    Ok((StatusCode::CREATED, Json(PostResponse { data: post })))
}

/// update_post
///
/// [Authenticated Route] Replaces title, content and category of a live post.
#[utoipa::path(
    put,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostInput,
    responses(
        (status = 200, description = "Updated", body = PostResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_post(
    _session: AdminSession,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> Result<Json<PostResponse>, AppError> {
    let Path(id) = id?;
    let Json(input) = payload?;
    let post = state.posts.update(id, input).await?;
    Ok(Json(PostResponse { data: post }))
}

/// delete_post
///
/// [Authenticated Route] Deletes a post. Whether the row is tombstoned or erased
/// depends on the deployment's post policy.
#[utoipa::path(
    delete,
    path = "/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_post(
    _session: AdminSession,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    state.posts.delete(id).await?;
    Ok(Json(MessageResponse {
        message: "post deleted".to_string(),
    }))
}
