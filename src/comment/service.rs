use crate::cache::redis::RedisCache;
use crate::comment::model::{
    assemble_thread, validate_content, CommentAuthor, CommentError, CommentResponse,
    CommentWithAuthor, CommentsListResponse, CreateCommentRequest,
};
use crate::notification::model::{EntityRef, NewNotification, NotificationType};
use crate::notification::service::NotificationService;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    redis_cache: Option<RedisCache>,
    notification_service: Arc<NotificationService>,
}

impl CommentService {
    pub fn new(
        pool: PgPool,
        redis_cache: Option<RedisCache>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            redis_cache,
            notification_service,
        }
    }

    /// Create a comment or a reply.
    ///
    /// The comment row, the project's comments_count and the notification
    /// to the project owner (or, for a reply, the parent comment's author)
    /// are written in one transaction. Replies may only target top-level
    /// comments of the same project.
    pub async fn create_comment(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        comment_data: CreateCommentRequest,
    ) -> Result<CommentResponse, CommentError> {
        let content = validate_content(&comment_data.content)?.to_string();

        // Explicit existence check instead of letting the foreign key blow up
        let project_owner =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM global.projects WHERE id = $1")
                .bind(project_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(CommentError::ProjectNotFound)?;

        // Resolve the reply target before the write
        let parent_author_id = if let Some(parent_id) = comment_data.parent_comment_id {
            let parent = sqlx::query(
                "SELECT user_id, project_id, parent_comment_id FROM global.comments WHERE id = $1",
            )
            .bind(parent_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CommentError::ParentCommentNotFound)?;

            if parent.get::<Uuid, _>("project_id") != project_id {
                return Err(CommentError::ParentProjectMismatch);
            }
            if parent.get::<Option<i64>, _>("parent_comment_id").is_some() {
                return Err(CommentError::ReplyDepthExceeded);
            }
            Some(parent.get::<Uuid, _>("user_id"))
        } else {
            None
        };

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO global.comments (
                user_id, project_id, parent_comment_id, content, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(comment_data.parent_comment_id)
        .bind(&content)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let comment_id = inserted.get::<i64, _>("id");

        sqlx::query("UPDATE global.projects SET comments_count = comments_count + 1 WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        let (notification_type, recipient) = match parent_author_id {
            Some(parent_author) => (NotificationType::Reply, parent_author),
            None => (NotificationType::Comment, project_owner),
        };

        let created = self
            .notification_service
            .create_in_tx(
                &mut tx,
                &NewNotification {
                    recipient_id: recipient,
                    actor_id: user_id,
                    notification_type,
                    entity: EntityRef::Comment(comment_id),
                },
            )
            .await
            .map_err(|e| match e {
                crate::notification::model::NotificationError::DatabaseError(e) => {
                    CommentError::DatabaseError(e)
                }
                crate::notification::model::NotificationError::NotFound => {
                    CommentError::ParentCommentNotFound
                }
            })?;

        tx.commit().await?;

        if created.is_some() {
            self.notification_service
                .invalidate_unread_count(&recipient)
                .await;
        }

        // The cached thread for this project is now stale
        if let Some(cache) = &self.redis_cache {
            if let Err(e) = cache.invalidate_project_comments(&project_id).await {
                warn!(
                    "Failed to invalidate comment cache for project {}: {}",
                    project_id, e
                );
            }
        }

        // Author profile for immediate UI display
        let author = sqlx::query_as::<_, CommentAuthor>(
            "SELECT id, name, avatar_url FROM global.users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Created comment {} on project {} by user {}",
            comment_id, project_id, user_id
        );
        Ok(CommentResponse {
            id: comment_id,
            content,
            author,
            parent_comment_id: comment_data.parent_comment_id,
            created_at: inserted.get::<DateTime<Utc>, _>("created_at"),
            updated_at: inserted.get::<DateTime<Utc>, _>("updated_at"),
            replies: Vec::new(),
        })
    }

    /// A project's full comment thread: top-level comments newest-first,
    /// each with its direct replies oldest-first.
    pub async fn get_project_comments(
        &self,
        project_id: Uuid,
    ) -> Result<CommentsListResponse, CommentError> {
        let total_count =
            sqlx::query_scalar::<_, i64>("SELECT comments_count FROM global.projects WHERE id = $1")
                .bind(project_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(CommentError::ProjectNotFound)?;

        // Try the cache first; a failure or stale JSON is just a miss
        if let Some(cache) = &self.redis_cache {
            match cache.get_project_comments(&project_id).await {
                Ok(Some(cached)) => match serde_json::from_str::<CommentsListResponse>(&cached) {
                    Ok(response) => return Ok(response),
                    Err(e) => warn!("Discarding undecodable comment cache entry: {}", e),
                },
                Ok(None) => {}
                Err(e) => warn!("Comment cache read failed for {}: {}", project_id, e),
            }
        }

        let rows = sqlx::query_as::<_, CommentWithAuthor>(
            r#"
            SELECT c.id, c.user_id, c.project_id, c.parent_comment_id, c.content,
                   c.created_at, c.updated_at,
                   u.name AS author_name, u.avatar_url AS author_avatar_url
            FROM global.comments c
            JOIN global.users u ON c.user_id = u.id
            WHERE c.project_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let response = CommentsListResponse {
            comments: assemble_thread(rows),
            total_count,
        };

        if let Some(cache) = &self.redis_cache {
            match serde_json::to_string(&response) {
                Ok(json) => {
                    if let Err(e) = cache.cache_project_comments(&project_id, &json).await {
                        warn!("Comment cache write failed for {}: {}", project_id, e);
                    }
                }
                Err(e) => warn!("Failed to serialize comment thread for cache: {}", e),
            }
        }

        info!(
            "Retrieved {} top-level comments for project {}",
            response.comments.len(),
            project_id
        );
        Ok(response)
    }
}
