use redis::{AsyncCommands, Client, RedisError};
use uuid::Uuid;

// Redis cache key prefixes
pub const PROJECT_COMMENTS_KEY_PREFIX: &str = "comments:project";
pub const UNREAD_COUNT_KEY_PREFIX: &str = "notifications:unread";
const PROJECT_COMMENTS_TTL_SECONDS: u64 = 300; // 5 minutes
const UNREAD_COUNT_TTL_SECONDS: u64 = 600; // 10 minutes

/// Best-effort read cache in front of Postgres. Every caller treats a
/// failure here as a cache miss; the database stays the source of truth.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub fn new(client: Client) -> Self {
        // Connection validation happens on first use
        Self { client }
    }

    /// Cached JSON for a project's comment thread
    pub async fn get_project_comments(
        &self,
        project_id: &Uuid,
    ) -> Result<Option<String>, RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", PROJECT_COMMENTS_KEY_PREFIX, project_id);
        connection.get(key).await
    }

    pub async fn cache_project_comments(
        &self,
        project_id: &Uuid,
        json_data: &str,
    ) -> Result<(), RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", PROJECT_COMMENTS_KEY_PREFIX, project_id);
        let _: () = connection
            .set_ex(key, json_data, PROJECT_COMMENTS_TTL_SECONDS)
            .await?;
        Ok(())
    }

    pub async fn invalidate_project_comments(&self, project_id: &Uuid) -> Result<(), RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", PROJECT_COMMENTS_KEY_PREFIX, project_id);
        let _: () = connection.del(key).await?;
        Ok(())
    }

    /// Cached unread-notification count for a user
    pub async fn get_unread_count(&self, user_id: &Uuid) -> Result<Option<i64>, RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", UNREAD_COUNT_KEY_PREFIX, user_id);
        connection.get(key).await
    }

    pub async fn cache_unread_count(&self, user_id: &Uuid, count: i64) -> Result<(), RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", UNREAD_COUNT_KEY_PREFIX, user_id);
        let _: () = connection
            .set_ex(key, count, UNREAD_COUNT_TTL_SECONDS)
            .await?;
        Ok(())
    }

    pub async fn invalidate_unread_count(&self, user_id: &Uuid) -> Result<(), RedisError> {
        let mut connection = self.client.get_multiplexed_async_connection().await?;
        let key = format!("{}:{}", UNREAD_COUNT_KEY_PREFIX, user_id);
        let _: () = connection.del(key).await?;
        Ok(())
    }
}
