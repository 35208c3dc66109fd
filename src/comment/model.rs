use crate::schema_ext::{DateTimeWrapper, UuidWrapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_COMMENT_LENGTH: usize = 5000;

/// Request to create a new comment
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateCommentRequest {
    /// The comment text
    #[schema(example = "Love the shader trick in this one!")]
    pub content: String,

    /// ID of the top-level comment being replied to, if this is a reply
    #[schema(example = "null")]
    pub parent_comment_id: Option<i64>,
}

/// Author information in comment responses
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CommentAuthor {
    /// User's UUID
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,

    /// User's display name
    #[schema(example = "Ada")]
    pub name: String,

    pub avatar_url: Option<String>,
}

/// Database row for a comment joined with its author's profile
#[derive(Debug, Clone, FromRow)]
pub struct CommentWithAuthor {
    pub id: i64,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub parent_comment_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: String,
    pub author_avatar_url: Option<String>,
}

impl CommentWithAuthor {
    pub fn into_response(self, replies: Vec<CommentResponse>) -> CommentResponse {
        CommentResponse {
            id: self.id,
            content: self.content,
            author: CommentAuthor {
                id: self.user_id,
                name: self.author_name,
                avatar_url: self.author_avatar_url,
            },
            parent_comment_id: self.parent_comment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            replies,
        }
    }
}

/// Response format for a single comment
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i64,
    pub content: String,
    pub author: CommentAuthor,
    pub parent_comment_id: Option<i64>,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = DateTimeWrapper)]
    pub updated_at: DateTime<Utc>,
    /// Direct replies, oldest first; always empty on a reply
    #[serde(default)]
    pub replies: Vec<CommentResponse>,
}

/// Response format for a project's comment thread
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentsListResponse {
    pub comments: Vec<CommentResponse>,
    pub total_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Project not found")]
    ProjectNotFound,

    #[error("Parent comment not found")]
    ParentCommentNotFound,

    #[error("Parent comment belongs to a different project")]
    ParentProjectMismatch,

    #[error("Replies to replies are not allowed")]
    ReplyDepthExceeded,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Validate comment text: non-empty after trimming, bounded length
pub fn validate_content(content: &str) -> Result<&str, CommentError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CommentError::ValidationError(
            "Comment content cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(CommentError::ValidationError(format!(
            "Comment content exceeds {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(trimmed)
}

/// Assemble a flat, chronologically ascending row set into the two-level
/// thread the client renders: top-level comments newest-first, each with
/// its direct replies oldest-first. Rows whose parent is not a top-level
/// comment in the set are dropped.
pub fn assemble_thread(rows: Vec<CommentWithAuthor>) -> Vec<CommentResponse> {
    let mut replies: HashMap<i64, Vec<CommentResponse>> = HashMap::new();
    let mut top_level: Vec<CommentWithAuthor> = Vec::new();

    for row in rows {
        match row.parent_comment_id {
            None => top_level.push(row),
            Some(parent_id) => replies
                .entry(parent_id)
                .or_default()
                .push(row.into_response(Vec::new())),
        }
    }

    let mut thread: Vec<CommentResponse> = top_level
        .into_iter()
        .map(|row| {
            let attached = replies.remove(&row.id).unwrap_or_default();
            row.into_response(attached)
        })
        .collect();

    thread.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    thread
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(
        id: i64,
        parent: Option<i64>,
        created_secs: i64,
        author: &str,
    ) -> CommentWithAuthor {
        let ts = Utc.timestamp_opt(created_secs, 0).unwrap();
        CommentWithAuthor {
            id,
            user_id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            parent_comment_id: parent,
            content: format!("comment {}", id),
            created_at: ts,
            updated_at: ts,
            author_name: author.to_string(),
            author_avatar_url: None,
        }
    }

    #[test]
    fn test_thread_top_level_newest_first() {
        let rows = vec![
            row(1, None, 100, "a"),
            row(2, None, 200, "b"),
            row(3, None, 300, "c"),
        ];
        let thread = assemble_thread(rows);
        let ids: Vec<i64> = thread.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_thread_attaches_replies_oldest_first() {
        let rows = vec![
            row(1, None, 100, "a"),
            row(2, Some(1), 150, "b"),
            row(3, Some(1), 250, "c"),
            row(4, None, 200, "d"),
        ];
        let thread = assemble_thread(rows);

        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].id, 4);
        assert!(thread[0].replies.is_empty());

        assert_eq!(thread[1].id, 1);
        let reply_ids: Vec<i64> = thread[1].replies.iter().map(|r| r.id).collect();
        assert_eq!(reply_ids, vec![2, 3]);
        assert!(thread[1].replies.iter().all(|r| r.replies.is_empty()));
    }

    #[test]
    fn test_thread_replies_only_under_their_parent() {
        let rows = vec![
            row(1, None, 100, "a"),
            row(2, None, 110, "b"),
            row(3, Some(2), 120, "c"),
        ];
        let thread = assemble_thread(rows);

        let top1 = thread.iter().find(|c| c.id == 1).unwrap();
        let top2 = thread.iter().find(|c| c.id == 2).unwrap();
        assert!(top1.replies.is_empty());
        assert_eq!(top2.replies.len(), 1);
        assert_eq!(top2.replies[0].id, 3);
    }

    #[test]
    fn test_thread_drops_orphaned_rows() {
        // Parent 99 is not in the set; the row cannot be rendered.
        let rows = vec![row(1, None, 100, "a"), row(2, Some(99), 110, "b")];
        let thread = assemble_thread(rows);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, 1);
        assert!(thread[0].replies.is_empty());
    }

    #[test]
    fn test_thread_ties_broken_by_id() {
        let rows = vec![row(1, None, 100, "a"), row(2, None, 100, "b")];
        let thread = assemble_thread(rows);
        let ids: Vec<i64> = thread.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_thread_empty_input() {
        assert!(assemble_thread(Vec::new()).is_empty());
    }

    #[test]
    fn test_validate_content_trims_and_accepts() {
        assert_eq!(validate_content("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn test_validate_content_rejects_empty() {
        assert!(matches!(
            validate_content("   \n\t "),
            Err(CommentError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_content_rejects_overlong() {
        let content = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            validate_content(&content),
            Err(CommentError::ValidationError(_))
        ));

        let content = "x".repeat(MAX_COMMENT_LENGTH);
        assert!(validate_content(&content).is_ok());
    }
}
