// src/handlers/posts.rs

use axum::{
    Extension,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::{
        comment::CreateCommentRequest,
        post::{ListPostsParams, PostQuery, PostRequest},
    },
    response::{self, ApiResponse, PageResponse},
    services::PostService,
    utils::jwt::Claims,
};

/// List posts, newest first.
/// Supports `page`, `limit`, `category` and `search` query parameters.
pub async fn list_posts(
    State(posts): State<PostService>,
    Query(params): Query<ListPostsParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = PostQuery::try_from(params)?;
    let page = posts.list(&query).await?;
    Ok(PageResponse::from(page))
}

/// Get a single post by ID. Counts as a view.
pub async fn get_post(
    State(posts): State<PostService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.get(id).await?;
    Ok(ApiResponse::ok(post))
}

/// Create a new post authored by the caller.
pub async fn create_post(
    State(posts): State<PostService>,
    Extension(claims): Extension<Claims>,
    ApiJson(payload): ApiJson<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.create(claims.user_id()?, payload).await?;
    Ok(response::created(post))
}

/// Update a post.
/// Requires: Login + Author.
pub async fn update_post(
    State(posts): State<PostService>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<PostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts.update(id, claims.user_id()?, payload).await?;
    Ok(ApiResponse::ok(post))
}

/// Delete a post (Hard Delete).
/// Requires: Login + Author.
pub async fn delete_post(
    State(posts): State<PostService>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    posts.delete(id, claims.user_id()?).await?;
    Ok(ApiResponse::ok(json!({})))
}

/// Add a comment to a post. Any logged-in user may comment.
pub async fn add_comment(
    State(posts): State<PostService>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let post = posts
        .add_comment(id, claims.user_id()?, payload.content)
        .await?;
    Ok(response::created(post))
}
