use crate::schema_ext::{DateTimeWrapper, UuidWrapper};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kinds of engagement that fan out a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Like,
    Favorite,
    Comment,
    Reply,
    Follow,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::Favorite => "favorite",
            NotificationType::Comment => "comment",
            NotificationType::Reply => "reply",
            NotificationType::Follow => "follow",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polymorphic reference to the entity a notification points at.
/// Stored as (entity_type, entity_id) columns; entity_id holds a UUID
/// string for projects/users and a decimal row id for comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Project(Uuid),
    Comment(i64),
    User(Uuid),
}

impl EntityRef {
    pub fn entity_type(&self) -> &'static str {
        match self {
            EntityRef::Project(_) => "project",
            EntityRef::Comment(_) => "comment",
            EntityRef::User(_) => "user",
        }
    }

    pub fn entity_id(&self) -> String {
        match self {
            EntityRef::Project(id) => id.to_string(),
            EntityRef::Comment(id) => id.to_string(),
            EntityRef::User(id) => id.to_string(),
        }
    }

    /// Parse the stored column pair back into a typed reference.
    /// Returns None for unknown types or malformed ids; callers render
    /// that as a notification without entity details.
    pub fn parse(entity_type: &str, entity_id: &str) -> Option<EntityRef> {
        match entity_type {
            "project" => Uuid::parse_str(entity_id).ok().map(EntityRef::Project),
            "comment" => entity_id.parse::<i64>().ok().map(EntityRef::Comment),
            "user" => Uuid::parse_str(entity_id).ok().map(EntityRef::User),
            _ => None,
        }
    }
}

/// Fan-out request, built by the engagement and comment services
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub notification_type: NotificationType,
    pub entity: EntityRef,
}

/// Database row joined with the actor's profile
#[derive(Debug, FromRow)]
pub struct NotificationRecord {
    pub id: i64,
    pub user_id: Uuid,
    pub actor_id: Uuid,
    pub notification_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub actor_name: Option<String>,
    pub actor_avatar_url: Option<String>,
}

/// Public profile of the user who triggered the notification
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActorBrief {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Denormalized snippet of a referenced project
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectSnippet {
    #[schema(value_type = UuidWrapper)]
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Denormalized snippet of a referenced comment
#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CommentSnippet {
    pub id: i64,
    pub content: String,
    #[schema(value_type = UuidWrapper)]
    pub project_id: Uuid,
}

/// A notification as returned to the client
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: String,
    pub actor: Option<ActorBrief>,
    pub entity_type: String,
    pub entity_id: String,
    /// Present when the notification references a still-existing project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSnippet>,
    /// Present when the notification references a still-existing comment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentSnippet>,
    pub is_read: bool,
    #[schema(value_type = DateTimeWrapper)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Notification not found")]
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_type_labels() {
        assert_eq!(NotificationType::Like.as_str(), "like");
        assert_eq!(NotificationType::Favorite.as_str(), "favorite");
        assert_eq!(NotificationType::Comment.as_str(), "comment");
        assert_eq!(NotificationType::Reply.as_str(), "reply");
        assert_eq!(NotificationType::Follow.as_str(), "follow");
        assert_eq!(NotificationType::Reply.to_string(), "reply");
    }

    #[test]
    fn test_entity_ref_round_trip() {
        let project = EntityRef::Project(Uuid::new_v4());
        let parsed = EntityRef::parse(project.entity_type(), &project.entity_id());
        assert_eq!(parsed, Some(project));

        let comment = EntityRef::Comment(42);
        let parsed = EntityRef::parse(comment.entity_type(), &comment.entity_id());
        assert_eq!(parsed, Some(comment));

        let user = EntityRef::User(Uuid::new_v4());
        let parsed = EntityRef::parse(user.entity_type(), &user.entity_id());
        assert_eq!(parsed, Some(user));
    }

    #[test]
    fn test_entity_ref_rejects_malformed_ids() {
        assert_eq!(EntityRef::parse("project", "not-a-uuid"), None);
        assert_eq!(EntityRef::parse("comment", "12.5"), None);
        assert_eq!(EntityRef::parse("comment", ""), None);
        assert_eq!(EntityRef::parse("user", "42"), None);
    }

    #[test]
    fn test_entity_ref_rejects_unknown_types() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(EntityRef::parse("share", &id), None);
        assert_eq!(EntityRef::parse("", &id), None);
        assert_eq!(EntityRef::parse("Project", &id), None);
    }

    #[test]
    fn test_notification_type_serde_lowercase() {
        let json = serde_json::to_string(&NotificationType::Follow).unwrap();
        assert_eq!(json, "\"follow\"");
        let back: NotificationType = serde_json::from_str("\"reply\"").unwrap();
        assert_eq!(back, NotificationType::Reply);
    }
}
