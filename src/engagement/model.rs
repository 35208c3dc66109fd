use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const MAX_PLATFORM_TAG_LENGTH: usize = 32;

/// Result of toggling a like; the counter reflects the post-toggle value
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleLikeResponse {
    pub is_liked: bool,
    pub likes_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleFavoriteResponse {
    pub is_bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleFollowResponse {
    pub is_following: bool,
}

/// Request to record a share event
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareRequest {
    /// Platform tag, e.g. "twitter" or "copy_link"
    #[schema(example = "twitter")]
    pub platform: String,
}

/// Per-viewer engagement state of a project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EngagementStatusResponse {
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub likes_count: i64,
    pub comments_count: i64,
}

/// Follower/following counts, with the viewer's own follow state when known
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowStatsResponse {
    pub followers: i64,
    pub following: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_following: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EngagementErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EngagementError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Project not found")]
    ProjectNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Users cannot follow themselves")]
    SelfFollow,

    #[error("Invalid platform tag: {0}")]
    InvalidPlatform(String),
}

/// Validate a share platform tag: non-empty after trimming, bounded length
pub fn validate_platform(platform: &str) -> Result<&str, EngagementError> {
    let trimmed = platform.trim();
    if trimmed.is_empty() {
        return Err(EngagementError::InvalidPlatform(
            "platform must not be empty".to_string(),
        ));
    }
    if trimmed.len() > MAX_PLATFORM_TAG_LENGTH {
        return Err(EngagementError::InvalidPlatform(format!(
            "platform exceeds {} characters",
            MAX_PLATFORM_TAG_LENGTH
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_accepts_known_tags() {
        for tag in ["twitter", "facebook", "linkedin", "weibo", "copy_link"] {
            assert_eq!(validate_platform(tag).unwrap(), tag);
        }
    }

    #[test]
    fn test_platform_trims_whitespace() {
        assert_eq!(validate_platform("  twitter  ").unwrap(), "twitter");
    }

    #[test]
    fn test_platform_rejects_empty() {
        assert!(matches!(
            validate_platform(""),
            Err(EngagementError::InvalidPlatform(_))
        ));
        assert!(matches!(
            validate_platform("   "),
            Err(EngagementError::InvalidPlatform(_))
        ));
    }

    #[test]
    fn test_platform_rejects_overlong_tags() {
        let tag = "x".repeat(MAX_PLATFORM_TAG_LENGTH + 1);
        assert!(matches!(
            validate_platform(&tag),
            Err(EngagementError::InvalidPlatform(_))
        ));

        let tag = "x".repeat(MAX_PLATFORM_TAG_LENGTH);
        assert!(validate_platform(&tag).is_ok());
    }
}
