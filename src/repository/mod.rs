// src/repository/mod.rs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    category::{Category, NewCategory},
    post::{NewPost, Post, PostChanges, PostFilter, PostRecord},
    user::{NewUser, User},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    /// A unique index rejected the write. Carries the offending column.
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    /// A foreign key points at a record that does not exist.
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest first, `limit` posts starting at `offset`, references resolved.
    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64)
    -> Result<Vec<Post>, RepoError>;

    async fn count(&self, filter: &PostFilter) -> Result<i64, RepoError>;

    /// Resolved read model including comments.
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;

    /// Bare row, used for ownership and title checks.
    async fn find_record(&self, id: i64) -> Result<Option<PostRecord>, RepoError>;

    /// Whether any post other than `exclude` already uses `slug`.
    async fn slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError>;

    /// Returns the new post's id.
    async fn insert(&self, post: NewPost) -> Result<i64, RepoError>;

    /// Returns false when no post has this id.
    async fn update(&self, id: i64, changes: PostChanges) -> Result<bool, RepoError>;

    /// Hard delete, comments included. Returns false when no post has this id.
    async fn delete(&self, id: i64) -> Result<bool, RepoError>;

    /// Adds one to the view counter. Returns false when no post has this id.
    async fn increment_views(&self, id: i64) -> Result<bool, RepoError>;

    async fn add_comment(&self, post_id: i64, user_id: i64, content: &str)
    -> Result<(), RepoError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError>;

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError>;

    async fn insert(&self, category: NewCategory) -> Result<Category, RepoError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;
}
