use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;

/// A comment embedded in a post, with its author resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    /// Absent for legacy or anonymous comments.
    pub user: Option<UserSummary>,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Comment {
    pub const ANONYMOUS: &'static str = "Anonymous";

    /// Name to display next to the comment.
    pub fn author_name(&self) -> &str {
        self.user
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(Self::ANONYMOUS)
    }
}

/// DTO for creating a new comment.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: Option<String>,
}
