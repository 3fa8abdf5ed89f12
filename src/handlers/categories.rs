// src/handlers/categories.rs

use axum::{extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    extract::{ApiJson, ApiPath},
    models::category::CreateCategoryRequest,
    response::{self, ApiResponse, ListResponse},
    services::CategoryService,
};

/// Lists all categories by name.
pub async fn list_categories(
    State(categories): State<CategoryService>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ListResponse::ok(categories.list().await?))
}

/// Retrieves a single category by ID.
pub async fn get_category(
    State(categories): State<CategoryService>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(categories.get(id).await?))
}

/// Creates a category. Requires login.
pub async fn create_category(
    State(categories): State<CategoryService>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = categories.create(payload).await?;
    Ok(response::created(category))
}
