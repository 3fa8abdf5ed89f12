// src/client.rs

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    models::{
        category::{Category, CreateCategoryRequest},
        comment::CreateCommentRequest,
        post::{Post, PostPage, PostQuery, PostRequest},
        user::{AuthResponse, LoginRequest, RegisterRequest, User},
    },
    response::{ApiResponse, ListResponse, PageResponse},
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Url(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Typed client for the blog API.
///
/// Fetches take their parameters explicitly and return owned snapshots.
/// A failure's `Display` is a single line fit to show next to the form
/// that triggered it.
#[derive(Clone, Debug)]
pub struct BlogClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl BlogClient {
    /// `base_url` is the server root, e.g. `http://localhost:5000`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: None,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn logout(&mut self) {
        self.token = None;
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .map(|e| e.lines().next().unwrap_or_default().trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| fallback.to_string());

        tracing::debug!(%status, %message, "request failed");
        Err(ClientError::Api { status, message })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let request = self.http.get(self.url(path)?);
        let body: ApiResponse<T> = self.send(request, fallback).await?;
        Ok(body.data)
    }

    async fn post_data<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
        fallback: &str,
    ) -> Result<T, ClientError> {
        let request = self.http.post(self.url(path)?).json(payload);
        let body: ApiResponse<T> = self.send(request, fallback).await?;
        Ok(body.data)
    }

    // --- Posts ---

    /// Fetches one page of posts. Filters left unset are not sent.
    pub async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, ClientError> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(category) = query.filter.category {
            params.push(("category", category.to_string()));
        }
        if let Some(search) = &query.filter.search {
            params.push(("search", search.clone()));
        }

        let request = self.http.get(self.url("api/posts")?).query(&params);
        let body: PageResponse = self.send(request, "Failed to fetch posts").await?;
        Ok(body.into())
    }

    pub async fn get_post(&self, id: i64) -> Result<Post, ClientError> {
        self.get_data(&format!("api/posts/{}", id), "Failed to fetch post")
            .await
    }

    pub async fn create_post(&self, payload: &PostRequest) -> Result<Post, ClientError> {
        self.post_data("api/posts", payload, "Failed to create post")
            .await
    }

    pub async fn update_post(&self, id: i64, payload: &PostRequest) -> Result<Post, ClientError> {
        let request = self
            .http
            .put(self.url(&format!("api/posts/{}", id))?)
            .json(payload);
        let body: ApiResponse<Post> = self.send(request, "Failed to update post").await?;
        Ok(body.data)
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ClientError> {
        let request = self.http.delete(self.url(&format!("api/posts/{}", id))?);
        let _: ApiResponse<serde_json::Value> =
            self.send(request, "Failed to delete post").await?;
        Ok(())
    }

    pub async fn add_comment(&self, post_id: i64, content: &str) -> Result<Post, ClientError> {
        let payload = CreateCommentRequest {
            content: Some(content.to_string()),
        };
        self.post_data(
            &format!("api/posts/{}/comments", post_id),
            &payload,
            "Failed to add comment",
        )
        .await
    }

    // --- Categories ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let request = self.http.get(self.url("api/categories")?);
        let body: ListResponse<Category> =
            self.send(request, "Failed to fetch categories").await?;
        Ok(body.data)
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, ClientError> {
        self.get_data(&format!("api/categories/{}", id), "Failed to fetch category")
            .await
    }

    pub async fn create_category(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, ClientError> {
        let payload = CreateCategoryRequest {
            name: Some(name.to_string()),
            description: description.map(str::to_string),
        };
        self.post_data("api/categories", &payload, "Failed to create category")
            .await
    }

    // --- Auth ---

    /// Registers and keeps the issued token for subsequent calls.
    pub async fn register(&mut self, payload: &RegisterRequest) -> Result<User, ClientError> {
        let auth: AuthResponse = self
            .post_data("api/auth/register", payload, "Failed to register")
            .await?;
        self.token = Some(auth.token);
        Ok(auth.user)
    }

    /// Logs in and keeps the issued token for subsequent calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, ClientError> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .post_data("api/auth/login", &payload, "Failed to log in")
            .await?;
        self.token = Some(auth.token);
        Ok(auth.user)
    }

    pub async fn me(&self) -> Result<User, ClientError> {
        self.get_data("api/auth/me", "Failed to fetch profile").await
    }
}
