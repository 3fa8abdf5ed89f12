// src/response.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::models::post::{Post, PostPage};

/// Standard successful API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Same envelope with a 201 status.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, ApiResponse::ok(data)).into_response()
}

/// List envelope: `{success, count, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn ok(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ListResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Paginated post envelope: `{success, count, total, page, pages, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub data: Vec<Post>,
}

impl From<PostPage> for PageResponse {
    fn from(page: PostPage) -> Self {
        Self {
            success: true,
            count: page.posts.len(),
            total: page.total,
            page: page.page,
            pages: page.pages,
            data: page.posts,
        }
    }
}

impl From<PageResponse> for PostPage {
    fn from(response: PageResponse) -> Self {
        Self {
            posts: response.data,
            total: response.total,
            page: response.page,
            pages: response.pages,
        }
    }
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
