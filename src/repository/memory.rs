// src/repository/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::{
        category::{Category, NewCategory},
        comment::Comment,
        post::{NewPost, Post, PostChanges, PostFilter, PostRecord},
        user::{NewUser, User},
    },
    repository::{CategoryRepository, PostRepository, RepoError, UserRepository},
};

struct StoredComment {
    id: i64,
    user_id: Option<i64>,
    content: String,
    created_at: chrono::DateTime<Utc>,
}

struct StoredPost {
    record: PostRecord,
    comments: Vec<StoredComment>,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, StoredPost>,
    last_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Joins a stored post against users and categories.
    fn resolve(&self, stored: &StoredPost) -> Result<Post, RepoError> {
        let record = &stored.record;
        let author = self
            .users
            .get(&record.author_id)
            .ok_or(RepoError::MissingReference("author"))?
            .summary();
        let category = self
            .categories
            .get(&record.category_id)
            .ok_or(RepoError::MissingReference("category"))?
            .summary();
        let comments = stored
            .comments
            .iter()
            .map(|c| Comment {
                id: c.id,
                user: c
                    .user_id
                    .and_then(|id| self.users.get(&id))
                    .map(User::summary),
                content: c.content.clone(),
                created_at: c.created_at,
            })
            .collect();

        Ok(Post {
            id: record.id,
            title: record.title.clone(),
            content: record.content.clone(),
            excerpt: record.excerpt.clone(),
            slug: record.slug.clone(),
            author,
            category,
            tags: record.tags.clone(),
            is_published: record.is_published,
            view_count: record.view_count,
            comments,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    /// Matching posts, newest first.
    fn filtered<'a>(&'a self, filter: &PostFilter) -> Vec<&'a StoredPost> {
        let needle = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut hits: Vec<&StoredPost> = self
            .posts
            .values()
            .filter(|p| {
                filter
                    .category
                    .is_none_or(|category| p.record.category_id == category)
            })
            .filter(|p| match &needle {
                Some(needle) => {
                    p.record.title.to_lowercase().contains(needle)
                        || p.record.content.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.record.id.cmp(&a.record.id))
        });
        hits
    }

    fn slug_taken(&self, slug: &str, exclude: Option<i64>) -> bool {
        self.posts
            .values()
            .any(|p| p.record.slug.as_deref() == Some(slug) && Some(p.record.id) != exclude)
    }
}

/// Thread-safe in-memory implementation of every repository trait.
/// Backs local runs without `DATABASE_URL`, and tests. Nothing persists.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn list(
        &self,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, RepoError> {
        let inner = self.inner.read().await;
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        inner
            .filtered(filter)
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| inner.resolve(p))
            .collect()
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.filtered(filter).len() as i64)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let inner = self.inner.read().await;
        inner.posts.get(&id).map(|p| inner.resolve(p)).transpose()
    }

    async fn find_record(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&id).map(|p| p.record.clone()))
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError> {
        Ok(self.inner.read().await.slug_taken(slug, exclude))
    }

    async fn insert(&self, post: NewPost) -> Result<i64, RepoError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&post.author_id) {
            return Err(RepoError::MissingReference("author"));
        }
        if !inner.categories.contains_key(&post.category_id) {
            return Err(RepoError::MissingReference("category"));
        }
        if inner.slug_taken(&post.slug, None) {
            return Err(RepoError::UniqueViolation("slug"));
        }

        let id = inner.next_id();
        let now = Utc::now();
        let record = PostRecord {
            id,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            slug: Some(post.slug),
            author_id: post.author_id,
            category_id: post.category_id,
            tags: post.tags,
            is_published: post.is_published,
            view_count: 0,
            created_at: now,
            updated_at: now,
        };
        inner.posts.insert(
            id,
            StoredPost {
                record,
                comments: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<bool, RepoError> {
        let mut inner = self.inner.write().await;
        if !inner.posts.contains_key(&id) {
            return Ok(false);
        }
        if let Some(category_id) = changes.category_id {
            if !inner.categories.contains_key(&category_id) {
                return Err(RepoError::MissingReference("category"));
            }
        }
        if let Some(slug) = &changes.slug {
            if inner.slug_taken(slug, Some(id)) {
                return Err(RepoError::UniqueViolation("slug"));
            }
        }

        let Some(stored) = inner.posts.get_mut(&id) else {
            return Ok(false);
        };
        let record = &mut stored.record;
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(slug) = changes.slug {
            record.slug = Some(slug);
        }
        if let Some(content) = changes.content {
            record.content = content;
        }
        if let Some(excerpt) = changes.excerpt {
            record.excerpt = excerpt;
        }
        if let Some(category_id) = changes.category_id {
            record.category_id = category_id;
        }
        if let Some(tags) = changes.tags {
            record.tags = tags;
        }
        if let Some(is_published) = changes.is_published {
            record.is_published = is_published;
        }
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.inner.write().await.posts.remove(&id).is_some())
    }

    async fn increment_views(&self, id: i64) -> Result<bool, RepoError> {
        let mut inner = self.inner.write().await;
        match inner.posts.get_mut(&id) {
            Some(stored) => {
                stored.record.view_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<(), RepoError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(RepoError::MissingReference("user"));
        }
        let id = inner.next_id();
        let stored = inner
            .posts
            .get_mut(&post_id)
            .ok_or(RepoError::MissingReference("post"))?;
        stored.comments.push(StoredComment {
            id,
            user_id: Some(user_id),
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let inner = self.inner.read().await;
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError> {
        Ok(self.inner.read().await.categories.get(&id).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.categories.values().any(|c| c.slug == slug))
    }

    async fn insert(&self, category: NewCategory) -> Result<Category, RepoError> {
        let mut inner = self.inner.write().await;
        if inner.categories.values().any(|c| c.name == category.name) {
            return Err(RepoError::UniqueViolation("name"));
        }
        if inner.categories.values().any(|c| c.slug == category.slug) {
            return Err(RepoError::UniqueViolation("slug"));
        }
        let category = Category {
            id: inner.next_id(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            created_at: Utc::now(),
        };
        inner.categories.insert(category.id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(RepoError::UniqueViolation("email"));
        }
        let user = User {
            id: inner.next_id(),
            name: user.name,
            email: user.email,
            password: user.password_hash,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}
