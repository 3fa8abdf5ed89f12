// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::{
    models::{
        category::{Category, CategorySummary, NewCategory},
        comment::Comment,
        post::{NewPost, Post, PostChanges, PostFilter, PostRecord},
        user::{NewUser, User, UserSummary},
    },
    repository::{CategoryRepository, PostRepository, RepoError, UserRepository},
};

/// Shared handle implementing every repository trait over one pool.
///
/// Queries are checked at runtime (`query_as` / `QueryBuilder`), so no live
/// database is needed to build.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads comments for the given posts and assembles the read models,
    /// preserving row order.
    async fn attach_comments(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT
                c.id, c.post_id, c.content, c.created_at,
                u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM comments c
            LEFT JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_post: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            by_post.entry(row.post_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let comments = by_post.remove(&row.id).unwrap_or_default();
                row.into_post(comments)
            })
            .collect())
    }
}

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.content, p.excerpt, p.slug, p.tags,
        p.is_published, p.view_count, p.created_at, p.updated_at,
        u.id AS author_id, u.name AS author_name, u.email AS author_email,
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM posts p
    JOIN users u ON u.id = p.author_id
    JOIN categories c ON c.id = p.category_id
"#;

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    excerpt: Option<String>,
    slug: Option<String>,
    tags: Vec<String>,
    is_published: bool,
    view_count: i64,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
    author_id: i64,
    author_name: String,
    author_email: String,
    category_id: i64,
    category_name: String,
    category_slug: String,
}

impl PostRow {
    fn into_post(self, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            slug: self.slug,
            author: UserSummary {
                id: self.author_id,
                name: self.author_name,
                email: self.author_email,
            },
            category: CategorySummary {
                id: self.category_id,
                name: self.category_name,
                slug: self.category_slug,
            },
            tags: self.tags,
            is_published: self.is_published,
            view_count: self.view_count,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    content: String,
    created_at: chrono::DateTime<chrono::Utc>,
    user_id: Option<i64>,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        let user = match (row.user_id, row.user_name, row.user_email) {
            (Some(id), Some(name), Some(email)) => Some(UserSummary { id, name, email }),
            _ => None,
        };
        Comment {
            id: row.id,
            user,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Appends `category AND (title OR content)` restrictions.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    qb.push(" WHERE TRUE");
    if let Some(category) = filter.category {
        qb.push(" AND p.category_id = ").push_bind(category);
    }
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Escapes LIKE wildcards so the search is a literal substring match.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Maps constraint names from the migrations to the column they guard.
fn constraint_field(constraint: &str) -> &'static str {
    match constraint {
        "posts_slug_key" | "categories_slug_key" => "slug",
        "categories_name_key" => "name",
        "users_email_key" => "email",
        "posts_author_id_fkey" => "author",
        "posts_category_id_fkey" => "category",
        "comments_post_id_fkey" => "post",
        "comments_user_id_fkey" => "user",
        _ => "record",
    }
}

/// Classifies constraint failures on writes; everything else is a plain database error.
fn map_write_error(err: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db) = &err {
        let field = constraint_field(db.constraint().unwrap_or_default());
        if db.is_unique_violation() {
            return RepoError::UniqueViolation(field);
        }
        if db.is_foreign_key_violation() {
            return RepoError::MissingReference(field);
        }
    }
    RepoError::Database(err)
}

#[async_trait]
impl PostRepository for PgStore {
    async fn list(
        &self,
        filter: &PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<PostRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.attach_comments(rows).await
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
        push_filter(&mut qb, filter);
        let total = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(POST_SELECT);
        qb.push(" WHERE p.id = ").push_bind(id);
        let row: Option<PostRow> = qb.build_query_as().fetch_optional(&self.pool).await?;

        match row {
            Some(row) => Ok(self.attach_comments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_record(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT
                id, title, content, excerpt, slug, author_id, category_id, tags,
                is_published, view_count, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<i64>) -> Result<bool, RepoError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(slug)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert(&self, post: NewPost) -> Result<i64, RepoError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO posts (title, content, excerpt, slug, author_id, category_id, tags, is_published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(post.title)
        .bind(post.content)
        .bind(post.excerpt)
        .bind(post.slug)
        .bind(post.author_id)
        .bind(post.category_id)
        .bind(post.tags)
        .bind(post.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(id)
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<bool, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE posts SET updated_at = NOW()");
        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(slug) = changes.slug {
            qb.push(", slug = ").push_bind(slug);
        }
        if let Some(content) = changes.content {
            qb.push(", content = ").push_bind(content);
        }
        if let Some(excerpt) = changes.excerpt {
            qb.push(", excerpt = ").push_bind(excerpt);
        }
        if let Some(category_id) = changes.category_id {
            qb.push(", category_id = ").push_bind(category_id);
        }
        if let Some(tags) = changes.tags {
            qb.push(", tags = ").push_bind(tags);
        }
        if let Some(is_published) = changes.is_published {
            qb.push(", is_published = ").push_bind(is_published);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_views(&self, id: i64) -> Result<bool, RepoError> {
        let result = sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: &str,
    ) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO comments (post_id, user_id, content) VALUES ($1, $2, $3)")
            .bind(post_id)
            .bind(user_id)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, RepoError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, description, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepoError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM categories WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, category: NewCategory) -> Result<Category, RepoError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description, created_at
            "#,
        )
        .bind(category.name)
        .bind(category.slug)
        .bind(category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(category)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password, created_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }
}
