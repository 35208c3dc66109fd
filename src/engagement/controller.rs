use crate::auth::middleware::AuthUser;
use crate::engagement::model::{
    EngagementError, EngagementErrorResponse, EngagementStatusResponse, FollowStatsResponse,
    ShareRequest, ToggleFavoriteResponse, ToggleFollowResponse, ToggleLikeResponse,
};
use crate::engagement::service::EngagementService;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// Helper function to convert EngagementError to HTTP response
fn engagement_error_to_response(err: EngagementError) -> (StatusCode, Json<EngagementErrorResponse>) {
    let (status, error_message, code) = match err {
        EngagementError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "DB_ERROR",
            )
        }
        EngagementError::ProjectNotFound => (
            StatusCode::NOT_FOUND,
            "Project not found",
            "PROJECT_NOT_FOUND",
        ),
        EngagementError::UserNotFound => {
            (StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND")
        }
        EngagementError::SelfFollow => (
            StatusCode::BAD_REQUEST,
            "Users cannot follow themselves",
            "SELF_FOLLOW",
        ),
        EngagementError::InvalidPlatform(_) => (
            StatusCode::BAD_REQUEST,
            "Invalid platform tag",
            "INVALID_PLATFORM",
        ),
    };

    let error_response = EngagementErrorResponse {
        error: error_message.to_string(),
        code: code.to_string(),
    };

    (status, Json(error_response))
}

/// Toggle a like on a project
///
/// Likes the project if the user has not liked it, unlikes it otherwise.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/like",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The ID of the project to like or unlike")
    ),
    responses(
        (status = 200, description = "Like toggled", body = ToggleLikeResponse),
        (status = 401, description = "Unauthorized", body = EngagementErrorResponse),
        (status = 404, description = "Project not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_like(
    Path(project_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
) -> impl IntoResponse {
    info!(
        "Toggling like on project: {}, user: {}",
        project_id, user.user_id
    );

    match engagement_service.toggle_like(user.user_id, project_id).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

/// Toggle a favorite (bookmark) on a project
#[utoipa::path(
    post,
    path = "/api/projects/{id}/favorite",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The ID of the project to bookmark or unbookmark")
    ),
    responses(
        (status = 200, description = "Favorite toggled", body = ToggleFavoriteResponse),
        (status = 401, description = "Unauthorized", body = EngagementErrorResponse),
        (status = 404, description = "Project not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_favorite(
    Path(project_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
) -> impl IntoResponse {
    info!(
        "Toggling favorite on project: {}, user: {}",
        project_id, user.user_id
    );

    match engagement_service
        .toggle_favorite(user.user_id, project_id)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

/// Follow or unfollow a user
#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The ID of the user to follow or unfollow")
    ),
    responses(
        (status = 200, description = "Follow toggled", body = ToggleFollowResponse),
        (status = 400, description = "Self-follow attempt", body = EngagementErrorResponse),
        (status = 401, description = "Unauthorized", body = EngagementErrorResponse),
        (status = 404, description = "User not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn toggle_follow(
    Path(following_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
) -> impl IntoResponse {
    info!(
        "Toggling follow: follower {}, following {}",
        user.user_id, following_id
    );

    match engagement_service
        .toggle_follow(user.user_id, following_id)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

/// Record a share event for a project
///
/// Appends a row to the share ledger; every click produces a new row.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/share",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The ID of the shared project")
    ),
    request_body = ShareRequest,
    responses(
        (status = 204, description = "Share recorded"),
        (status = 400, description = "Invalid platform tag", body = EngagementErrorResponse),
        (status = 401, description = "Unauthorized", body = EngagementErrorResponse),
        (status = 404, description = "Project not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn record_share(
    Path(project_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
    Json(share): Json<ShareRequest>,
) -> impl IntoResponse {
    match engagement_service
        .record_share(user.user_id, project_id, &share.platform)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

/// Engagement state of a project for the authenticated user
#[utoipa::path(
    get,
    path = "/api/projects/{id}/engagement",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The project ID")
    ),
    responses(
        (status = 200, description = "Engagement status", body = EngagementStatusResponse),
        (status = 401, description = "Unauthorized", body = EngagementErrorResponse),
        (status = 404, description = "Project not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn engagement_status(
    Path(project_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
) -> impl IntoResponse {
    match engagement_service
        .engagement_status(user.user_id, project_id)
        .await
    {
        Ok(status) => (StatusCode::OK, Json(status)).into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

/// Follower and following counts for a user
///
/// Public endpoint; is_following is included when the request carries a
/// valid bearer token.
#[utoipa::path(
    get,
    path = "/api/users/{id}/follow-stats",
    tag = "engagement",
    params(
        ("id" = String, Path, description = "The user ID")
    ),
    responses(
        (status = 200, description = "Follow stats", body = FollowStatsResponse),
        (status = 404, description = "User not found", body = EngagementErrorResponse),
        (status = 500, description = "Internal server error", body = EngagementErrorResponse)
    )
)]
pub async fn follow_stats(
    Path(user_id): Path<Uuid>,
    viewer: Option<AuthUser>,
    Extension(engagement_service): Extension<Arc<EngagementService>>,
) -> impl IntoResponse {
    match engagement_service
        .follow_stats(user_id, viewer.map(|v| v.user_id))
        .await
    {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => engagement_error_to_response(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_follow_maps_to_400() {
        let (status, body) = engagement_error_to_response(EngagementError::SelfFollow);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "SELF_FOLLOW");
    }

    #[test]
    fn test_not_found_variants_map_to_404() {
        let (status, body) = engagement_error_to_response(EngagementError::ProjectNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, "PROJECT_NOT_FOUND");

        let (status, body) = engagement_error_to_response(EngagementError::UserNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, "USER_NOT_FOUND");
    }

    #[test]
    fn test_invalid_platform_maps_to_400() {
        let err = EngagementError::InvalidPlatform("empty".to_string());
        let (status, body) = engagement_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "INVALID_PLATFORM");
    }

    #[test]
    fn test_database_error_hides_detail() {
        let err = EngagementError::DatabaseError(sqlx::Error::PoolClosed);
        let (_, body) = engagement_error_to_response(err);
        assert_eq!(body.0.error, "Database error");
    }
}
