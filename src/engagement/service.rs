use crate::engagement::model::{
    validate_platform, EngagementError, EngagementStatusResponse, FollowStatsResponse,
    ToggleFavoriteResponse, ToggleFollowResponse, ToggleLikeResponse,
};
use crate::notification::model::{EntityRef, NewNotification, NotificationType};
use crate::notification::service::NotificationService;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Toggled relationships (like, favorite, follow) and the share ledger.
///
/// Every toggle runs as one transaction: the join-row change, the
/// denormalized counter and the notification fan-out commit or roll back
/// together. The unique constraints on the join tables make concurrent
/// double-toggles safe; the delete-first/insert-on-conflict pattern below
/// never adjusts a counter unless a row actually changed.
#[derive(Clone)]
pub struct EngagementService {
    pool: PgPool,
    notification_service: Arc<NotificationService>,
}

impl EngagementService {
    pub fn new(pool: PgPool, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    /// Owner of a project, or ProjectNotFound
    async fn project_owner(&self, project_id: Uuid) -> Result<Uuid, EngagementError> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM global.projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(EngagementError::ProjectNotFound)
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, EngagementError> {
        let exists = sqlx::query("SELECT EXISTS(SELECT 1 FROM global.users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?
            .get::<bool, _>(0);
        Ok(exists)
    }

    /// Toggle a like. Adjusts the project's denormalized counter in the
    /// same transaction and notifies the owner on the transition to liked.
    pub async fn toggle_like(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ToggleLikeResponse, EngagementError> {
        let owner = self.project_owner(project_id).await?;

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM global.likes WHERE user_id = $1 AND project_id = $2")
            .bind(user_id)
            .bind(project_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut notified = None;
        let (is_liked, likes_count) = if deleted > 0 {
            let count = sqlx::query_scalar::<_, i64>(
                "UPDATE global.projects SET likes_count = likes_count - 1 WHERE id = $1 RETURNING likes_count",
            )
            .bind(project_id)
            .fetch_one(&mut *tx)
            .await?;
            (false, count)
        } else {
            let inserted = sqlx::query(
                r#"
                INSERT INTO global.likes (user_id, project_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, project_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(project_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                let count = sqlx::query_scalar::<_, i64>(
                    "UPDATE global.projects SET likes_count = likes_count + 1 WHERE id = $1 RETURNING likes_count",
                )
                .bind(project_id)
                .fetch_one(&mut *tx)
                .await?;

                let created = self
                    .notification_service
                    .create_in_tx(
                        &mut tx,
                        &NewNotification {
                            recipient_id: owner,
                            actor_id: user_id,
                            notification_type: NotificationType::Like,
                            entity: EntityRef::Project(project_id),
                        },
                    )
                    .await
                    .map_err(EngagementError::from_notification)?;
                if created.is_some() {
                    notified = Some(owner);
                }
                (true, count)
            } else {
                // A concurrent toggle already inserted the row; the counter
                // was adjusted by whoever won the constraint.
                let count = sqlx::query_scalar::<_, i64>(
                    "SELECT likes_count FROM global.projects WHERE id = $1",
                )
                .bind(project_id)
                .fetch_one(&mut *tx)
                .await?;
                (true, count)
            }
        };

        tx.commit().await?;

        if let Some(recipient) = notified {
            self.notification_service
                .invalidate_unread_count(&recipient)
                .await;
        }

        info!(
            "User {} toggled like on project {}: is_liked={}",
            user_id, project_id, is_liked
        );
        Ok(ToggleLikeResponse {
            is_liked,
            likes_count,
        })
    }

    /// Toggle a favorite (bookmark). No counter; notifies the owner on
    /// the transition to favorited.
    pub async fn toggle_favorite(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<ToggleFavoriteResponse, EngagementError> {
        let owner = self.project_owner(project_id).await?;

        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM global.favorites WHERE user_id = $1 AND project_id = $2")
                .bind(user_id)
                .bind(project_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let mut notified = None;
        let is_bookmarked = if deleted > 0 {
            false
        } else {
            let inserted = sqlx::query(
                r#"
                INSERT INTO global.favorites (user_id, project_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, project_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(project_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                let created = self
                    .notification_service
                    .create_in_tx(
                        &mut tx,
                        &NewNotification {
                            recipient_id: owner,
                            actor_id: user_id,
                            notification_type: NotificationType::Favorite,
                            entity: EntityRef::Project(project_id),
                        },
                    )
                    .await
                    .map_err(EngagementError::from_notification)?;
                if created.is_some() {
                    notified = Some(owner);
                }
            }
            true
        };

        tx.commit().await?;

        if let Some(recipient) = notified {
            self.notification_service
                .invalidate_unread_count(&recipient)
                .await;
        }

        info!(
            "User {} toggled favorite on project {}: is_bookmarked={}",
            user_id, project_id, is_bookmarked
        );
        Ok(ToggleFavoriteResponse { is_bookmarked })
    }

    /// Toggle a follow relationship. Self-follow is rejected before any
    /// storage access; the followed user is notified on the transition
    /// to following.
    pub async fn toggle_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> Result<ToggleFollowResponse, EngagementError> {
        if follower_id == following_id {
            return Err(EngagementError::SelfFollow);
        }

        if !self.user_exists(following_id).await? {
            return Err(EngagementError::UserNotFound);
        }

        let mut tx = self.pool.begin().await?;

        let deleted =
            sqlx::query("DELETE FROM global.follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let mut notified = None;
        let is_following = if deleted > 0 {
            false
        } else {
            let inserted = sqlx::query(
                r#"
                INSERT INTO global.follows (follower_id, following_id, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (follower_id, following_id) DO NOTHING
                "#,
            )
            .bind(follower_id)
            .bind(following_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                let created = self
                    .notification_service
                    .create_in_tx(
                        &mut tx,
                        &NewNotification {
                            recipient_id: following_id,
                            actor_id: follower_id,
                            notification_type: NotificationType::Follow,
                            entity: EntityRef::User(follower_id),
                        },
                    )
                    .await
                    .map_err(EngagementError::from_notification)?;
                if created.is_some() {
                    notified = Some(following_id);
                }
            }
            true
        };

        tx.commit().await?;

        if let Some(recipient) = notified {
            self.notification_service
                .invalidate_unread_count(&recipient)
                .await;
        }

        info!(
            "User {} toggled follow on user {}: is_following={}",
            follower_id, following_id, is_following
        );
        Ok(ToggleFollowResponse { is_following })
    }

    /// Append a share event to the ledger. No counter, no notification.
    pub async fn record_share(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        platform: &str,
    ) -> Result<(), EngagementError> {
        let platform = validate_platform(platform)?;

        // Explicit existence check so a bad project id is a clean 404
        // instead of a foreign-key violation.
        self.project_owner(project_id).await?;

        sqlx::query(
            r#"
            INSERT INTO global.shares (user_id, project_id, platform, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .bind(platform)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(
            "User {} shared project {} via {}",
            user_id, project_id, platform
        );
        Ok(())
    }

    /// A viewer's engagement state on a project, plus the counters
    pub async fn engagement_status(
        &self,
        user_id: Uuid,
        project_id: Uuid,
    ) -> Result<EngagementStatusResponse, EngagementError> {
        let counters = sqlx::query(
            "SELECT likes_count, comments_count FROM global.projects WHERE id = $1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EngagementError::ProjectNotFound)?;

        let is_liked = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM global.likes WHERE user_id = $1 AND project_id = $2)",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?
        .get::<bool, _>(0);

        let is_bookmarked = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM global.favorites WHERE user_id = $1 AND project_id = $2)",
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(&self.pool)
        .await?
        .get::<bool, _>(0);

        Ok(EngagementStatusResponse {
            is_liked,
            is_bookmarked,
            likes_count: counters.get::<i64, _>("likes_count"),
            comments_count: counters.get::<i64, _>("comments_count"),
        })
    }

    /// Follower/following counts for a profile page; is_following is
    /// resolved when a viewer is known.
    pub async fn follow_stats(
        &self,
        user_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<FollowStatsResponse, EngagementError> {
        if !self.user_exists(user_id).await? {
            return Err(EngagementError::UserNotFound);
        }

        let followers = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.follows WHERE following_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let following = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.follows WHERE follower_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let is_following = match viewer_id {
            Some(viewer) => Some(
                sqlx::query(
                    "SELECT EXISTS(SELECT 1 FROM global.follows WHERE follower_id = $1 AND following_id = $2)",
                )
                .bind(viewer)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
                .get::<bool, _>(0),
            ),
            None => None,
        };

        Ok(FollowStatsResponse {
            followers,
            following,
            is_following,
        })
    }
}

impl EngagementError {
    fn from_notification(err: crate::notification::model::NotificationError) -> Self {
        match err {
            crate::notification::model::NotificationError::DatabaseError(e) => {
                EngagementError::DatabaseError(e)
            }
            // create_in_tx only surfaces database errors; anything else
            // would be a recipient lookup gone missing mid-transaction.
            crate::notification::model::NotificationError::NotFound => {
                EngagementError::UserNotFound
            }
        }
    }
}
