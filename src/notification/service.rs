use crate::cache::redis::RedisCache;
use crate::notification::model::{
    ActorBrief, CommentSnippet, EntityRef, NewNotification, NotificationError,
    NotificationListResponse, NotificationRecord, NotificationResponse, ProjectSnippet,
};
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
    redis_cache: Option<RedisCache>,
}

impl NotificationService {
    pub fn new(pool: PgPool, redis_cache: Option<RedisCache>) -> Self {
        Self { pool, redis_cache }
    }

    /// Insert a notification row inside the caller's transaction, so the
    /// fan-out commits or rolls back together with the action that caused
    /// it. Self-actions are suppressed here and report None.
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        notification: &NewNotification,
    ) -> Result<Option<i64>, NotificationError> {
        if notification.recipient_id == notification.actor_id {
            return Ok(None);
        }

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO global.notifications (
                user_id, actor_id, notification_type, entity_type, entity_id, is_read, created_at
            )
            VALUES ($1, $2, $3, $4, $5, false, $6)
            RETURNING id
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.actor_id)
        .bind(notification.notification_type.as_str())
        .bind(notification.entity.entity_type())
        .bind(notification.entity.entity_id())
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;

        info!(
            "Created {} notification {} for recipient {}",
            notification.notification_type, id, notification.recipient_id
        );
        Ok(Some(id))
    }

    /// Drop the cached unread count after a write that changed it.
    /// Best effort: a cache failure only shortens the cache's usefulness.
    pub async fn invalidate_unread_count(&self, user_id: &Uuid) {
        if let Some(cache) = &self.redis_cache {
            if let Err(e) = cache.invalidate_unread_count(user_id).await {
                warn!("Failed to invalidate unread count for {}: {}", user_id, e);
            }
        }
    }

    /// List a user's notifications newest-first, enriched with the actor's
    /// profile and a snippet of the referenced project or comment. Dangling
    /// references resolve to absent details rather than failing the page.
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<NotificationListResponse, NotificationError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0).max(0);

        let records = sqlx::query_as::<_, NotificationRecord>(
            r#"
            SELECT n.id, n.user_id, n.actor_id, n.notification_type, n.entity_type,
                   n.entity_id, n.is_read, n.created_at,
                   u.name AS actor_name, u.avatar_url AS actor_avatar_url
            FROM global.notifications n
            LEFT JOIN global.users u ON n.actor_id = u.id
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(records.len());
        for record in records {
            notifications.push(self.enrich(record).await?);
        }

        let unread_count = self.unread_count(user_id).await?;

        info!(
            "Retrieved {} notifications for user {}",
            notifications.len(),
            user_id
        );
        Ok(NotificationListResponse {
            notifications,
            unread_count,
        })
    }

    async fn enrich(
        &self,
        record: NotificationRecord,
    ) -> Result<NotificationResponse, NotificationError> {
        let entity = EntityRef::parse(&record.entity_type, &record.entity_id);

        let (project, comment) = match entity {
            Some(EntityRef::Project(project_id)) => {
                let snippet = sqlx::query_as::<_, ProjectSnippet>(
                    "SELECT id, title, description FROM global.projects WHERE id = $1",
                )
                .bind(project_id)
                .fetch_optional(&self.pool)
                .await?;
                (snippet, None)
            }
            Some(EntityRef::Comment(comment_id)) => {
                let snippet = sqlx::query_as::<_, CommentSnippet>(
                    "SELECT id, content, project_id FROM global.comments WHERE id = $1",
                )
                .bind(comment_id)
                .fetch_optional(&self.pool)
                .await?;
                (None, snippet)
            }
            Some(EntityRef::User(_)) | None => (None, None),
        };

        let actor = record.actor_name.map(|name| ActorBrief {
            id: record.actor_id,
            name,
            avatar_url: record.actor_avatar_url,
        });

        Ok(NotificationResponse {
            id: record.id,
            notification_type: record.notification_type,
            actor,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            project,
            comment,
            is_read: record.is_read,
            created_at: record.created_at,
        })
    }

    /// Count of unread notifications, served from the cache when possible
    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, NotificationError> {
        if let Some(cache) = &self.redis_cache {
            match cache.get_unread_count(&user_id).await {
                Ok(Some(count)) => return Ok(count),
                Ok(None) => {}
                Err(e) => warn!("Unread count cache read failed for {}: {}", user_id, e),
            }
        }

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if let Some(cache) = &self.redis_cache {
            if let Err(e) = cache.cache_unread_count(&user_id, count).await {
                warn!("Unread count cache write failed for {}: {}", user_id, e);
            }
        }

        Ok(count)
    }

    /// Mark one notification as read. Idempotent for an already-read row;
    /// a row that does not exist or belongs to another user is NotFound.
    pub async fn mark_as_read(
        &self,
        user_id: Uuid,
        notification_id: i64,
    ) -> Result<(), NotificationError> {
        let affected = sqlx::query(
            "UPDATE global.notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(NotificationError::NotFound);
        }

        self.invalidate_unread_count(&user_id).await;
        info!("Marked notification {} as read", notification_id);
        Ok(())
    }

    /// Mark every notification for a user as read. Idempotent bulk update.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, NotificationError> {
        let affected = sqlx::query(
            "UPDATE global.notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        self.invalidate_unread_count(&user_id).await;
        info!(
            "Marked {} notifications as read for user {}",
            affected, user_id
        );
        Ok(affected)
    }
}
