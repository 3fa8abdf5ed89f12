use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::{category::CategorySummary, comment::Comment, user::UserSummary};

/// Represents a row of the 'posts' table, references unresolved.
#[derive(Debug, Clone, FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub author_id: i64,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub view_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A post with author, category and comment authors resolved.
/// This is the shape every post endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub author: UserSummary,
    pub category: CategorySummary,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub view_count: i64,
    pub comments: Vec<Comment>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for the post repository. Validated and slugged already.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub slug: String,
    pub author_id: i64,
    pub category_id: i64,
    pub tags: Vec<String>,
    pub is_published: bool,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` clears the excerpt.
    pub excerpt: Option<Option<String>>,
    pub category_id: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

/// DTO for creating or updating a post.
///
/// Every field is optional at the wire level; create enforces the
/// required ones, update applies whatever is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostRequest {
    #[validate(length(max = 100, message = "Title cannot be more than 100 characters"))]
    pub title: Option<String>,

    pub content: Option<String>,

    pub category: Option<i64>,

    #[validate(length(max = 200, message = "Excerpt cannot be more than 200 characters"))]
    pub excerpt: Option<String>,

    pub tags: Option<Vec<String>>,

    pub is_published: Option<bool>,
}

impl PostRequest {
    /// Trims text fields and drops blank tags.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.map(|t| t.trim().to_string()),
            content: self.content.map(|c| c.trim().to_string()),
            category: self.category,
            excerpt: self.excerpt.map(|e| e.trim().to_string()),
            tags: self.tags.map(|tags| {
                tags.into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            }),
            is_published: self.is_published,
        }
    }
}

/// Raw query parameters for listing posts.
///
/// Kept as strings so that malformed numbers fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListPostsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Restrictions applied to a post listing.
///
/// With both set, a post matches when it is in `category` AND its title
/// or content contains `search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category: Option<i64>,
    /// Case-insensitive literal substring.
    pub search: Option<String>,
}

/// A fully parsed listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub page: i64,
    pub limit: i64,
    pub filter: PostFilter,
}

impl PostQuery {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
            filter: PostFilter::default(),
        }
    }

    pub fn with_category(mut self, category: i64) -> Self {
        self.filter.category = Some(category);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.filter.search = Some(search.into());
        self
    }

    /// Saturates for absurd pages, which then simply match nothing.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PostQuery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_LIMIT)
    }
}

impl TryFrom<ListPostsParams> for PostQuery {
    type Error = crate::error::AppError;

    fn try_from(params: ListPostsParams) -> Result<Self, Self::Error> {
        let page = parse_positive(params.page.as_deref()).unwrap_or(Self::DEFAULT_PAGE);
        let limit = parse_positive(params.limit.as_deref()).unwrap_or(Self::DEFAULT_LIMIT);
        let mut query = Self::new(page, limit);

        if let Some(category) = non_blank(params.category) {
            let id = category.parse::<i64>().map_err(|_| {
                crate::error::AppError::invalid_field("category", "Invalid category id")
            })?;
            query = query.with_category(id);
        }
        if let Some(search) = non_blank(params.search) {
            query = query.with_search(search);
        }
        Ok(query)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// One page of a post listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl PostPage {
    pub fn new(posts: Vec<Post>, total: i64, query: &PostQuery) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + query.limit - 1) / query.limit
        };
        Self {
            posts,
            total,
            page: query.page,
            pages,
        }
    }
}
