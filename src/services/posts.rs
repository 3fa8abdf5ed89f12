// src/services/posts.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, FieldError, field_errors},
    models::post::{NewPost, Post, PostChanges, PostPage, PostQuery, PostRequest},
    repository::{PostRepository, RepoError},
    services::SLUG_WRITE_ATTEMPTS,
    utils::slug,
};

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// Create input after validation.
#[derive(Debug)]
struct Draft {
    title: String,
    content: String,
    category_id: i64,
    excerpt: Option<String>,
    tags: Vec<String>,
    is_published: bool,
}

/// Checks required fields and lengths for a new post. Touches no storage.
fn validate_new(req: PostRequest) -> Result<Draft, AppError> {
    let req = req.normalized();
    let mut errors = Vec::new();

    let title = req.title.clone().filter(|t| !t.is_empty());
    if title.is_none() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    let content = req.content.clone().filter(|c| !c.is_empty());
    if content.is_none() {
        errors.push(FieldError::new("content", "Content is required"));
    }
    if req.category.is_none() {
        errors.push(FieldError::new("category", "Category is required"));
    }
    if let Err(e) = req.validate() {
        errors.extend(field_errors(&e));
    }

    match (title, content, req.category) {
        (Some(title), Some(content), Some(category_id)) if errors.is_empty() => Ok(Draft {
            title,
            content,
            category_id,
            excerpt: req.excerpt.filter(|e| !e.is_empty()),
            tags: req.tags.unwrap_or_default(),
            is_published: req.is_published.unwrap_or(true),
        }),
        _ => Err(AppError::validation(errors)),
    }
}

/// Checks the fields present in an update. Absent fields stay untouched.
fn validate_changes(req: PostRequest) -> Result<PostChanges, AppError> {
    let req = req.normalized();
    let mut errors = Vec::new();

    if req.title.as_deref() == Some("") {
        errors.push(FieldError::new("title", "Title cannot be empty"));
    }
    if req.content.as_deref() == Some("") {
        errors.push(FieldError::new("content", "Content cannot be empty"));
    }
    if let Err(e) = req.validate() {
        errors.extend(field_errors(&e));
    }
    if !errors.is_empty() {
        return Err(AppError::validation(errors));
    }

    Ok(PostChanges {
        title: req.title,
        slug: None,
        content: req.content,
        excerpt: req.excerpt.map(|e| Some(e).filter(|e| !e.is_empty())),
        category_id: req.category,
        tags: req.tags,
        is_published: req.is_published,
    })
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>) -> Self {
        Self { repo }
    }

    /// One page of posts, newest first.
    pub async fn list(&self, query: &PostQuery) -> Result<PostPage, AppError> {
        let posts = self
            .repo
            .list(&query.filter, query.offset(), query.limit)
            .await?;
        let total = self.repo.count(&query.filter).await?;
        Ok(PostPage::new(posts, total, query))
    }

    /// Fetches a post and counts the view.
    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        if !self.repo.increment_views(id).await? {
            return Err(not_found());
        }
        self.resolved(id).await
    }

    pub async fn create(&self, author_id: i64, req: PostRequest) -> Result<Post, AppError> {
        let draft = validate_new(req)?;
        let base = slug::base_slug(&draft.title, "post");

        let mut attempt = 1;
        let id = loop {
            let slug = self.free_slug(&base, None).await?;
            let post = NewPost {
                title: draft.title.clone(),
                content: draft.content.clone(),
                excerpt: draft.excerpt.clone(),
                slug,
                author_id,
                category_id: draft.category_id,
                tags: draft.tags.clone(),
                is_published: draft.is_published,
            };
            match self.repo.insert(post).await {
                Ok(id) => break id,
                Err(RepoError::UniqueViolation("slug")) if attempt < SLUG_WRITE_ATTEMPTS => {
                    tracing::warn!(base = %base, attempt, "slug taken concurrently, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };

        tracing::info!(post_id = id, author_id, "post created");
        self.resolved(id).await
    }

    /// Owner-only partial update. The slug follows the title only when the title changes.
    pub async fn update(
        &self,
        id: i64,
        author_id: i64,
        req: PostRequest,
    ) -> Result<Post, AppError> {
        let mut changes = validate_changes(req)?;
        let existing = self.repo.find_record(id).await?.ok_or_else(not_found)?;
        if existing.author_id != author_id {
            return Err(AppError::Forbidden(
                "Not authorized to update this post".to_string(),
            ));
        }

        let base = changes
            .title
            .as_ref()
            .filter(|title| **title != existing.title)
            .map(|title| slug::base_slug(title, "post"));

        let mut attempt = 1;
        loop {
            if let Some(base) = &base {
                changes.slug = Some(self.free_slug(base, Some(id)).await?);
            }
            match self.repo.update(id, changes.clone()).await {
                Ok(true) => break,
                Ok(false) => return Err(not_found()),
                Err(RepoError::UniqueViolation("slug"))
                    if base.is_some() && attempt < SLUG_WRITE_ATTEMPTS =>
                {
                    tracing::warn!(post_id = id, attempt, "slug taken concurrently, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(post_id = id, "post updated");
        self.resolved(id).await
    }

    /// Owner-only hard delete.
    pub async fn delete(&self, id: i64, author_id: i64) -> Result<(), AppError> {
        let existing = self.repo.find_record(id).await?.ok_or_else(not_found)?;
        if existing.author_id != author_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this post".to_string(),
            ));
        }
        if !self.repo.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    /// Appends a comment from any authenticated user.
    pub async fn add_comment(
        &self,
        id: i64,
        author_id: i64,
        content: Option<String>,
    ) -> Result<Post, AppError> {
        let content = content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::invalid_field("content", "Please provide comment content"))?;

        if self.repo.find_record(id).await?.is_none() {
            return Err(not_found());
        }
        match self.repo.add_comment(id, author_id, &content).await {
            Ok(()) => {}
            Err(RepoError::MissingReference("post")) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        }
        self.resolved(id).await
    }

    async fn resolved(&self, id: i64) -> Result<Post, AppError> {
        self.repo.find_by_id(id).await?.ok_or_else(not_found)
    }

    async fn free_slug(&self, base: &str, exclude: Option<i64>) -> Result<String, AppError> {
        let repo = &self.repo;
        let slug = slug::resolve_unique(base, |candidate| async move {
            repo.slug_exists(&candidate, exclude).await
        })
        .await?;
        Ok(slug)
    }
}
