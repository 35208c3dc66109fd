use crate::auth::middleware::AuthUser;
use crate::notification::model::{
    NotificationError, NotificationErrorResponse, NotificationListResponse, UnreadCountResponse,
};
use crate::notification::service::NotificationService;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

// Query parameters for pagination
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct NotificationsQueryParams {
    #[schema(example = "20")]
    limit: Option<i64>,
    #[schema(example = "0")]
    offset: Option<i64>,
}

// Helper function to convert NotificationError to HTTP response
fn notification_error_to_response(
    err: NotificationError,
) -> (StatusCode, Json<NotificationErrorResponse>) {
    let (status, error_message, code) = match err {
        NotificationError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "DB_ERROR",
            )
        }
        NotificationError::NotFound => (
            StatusCode::NOT_FOUND,
            "Notification not found",
            "NOT_FOUND",
        ),
    };

    let error_response = NotificationErrorResponse {
        error: error_message.to_string(),
        code: code.to_string(),
    };

    (status, Json(error_response))
}

/// List the authenticated user's notifications
///
/// Returns notifications newest-first, enriched with the actor's profile
/// and a snippet of the referenced project or comment.
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "notifications",
    params(NotificationsQueryParams),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = NotificationListResponse),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse),
        (status = 500, description = "Internal server error", body = NotificationErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_notifications(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
    Query(params): Query<NotificationsQueryParams>,
) -> impl IntoResponse {
    match notification_service
        .list_notifications(user.user_id, params.limit, params.offset)
        .await
    {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Count of unread notifications for the authenticated user
#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread count retrieved", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse),
        (status = 500, description = "Internal server error", body = NotificationErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unread_count(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service.unread_count(user.user_id).await {
        Ok(count) => (
            StatusCode::OK,
            Json(UnreadCountResponse {
                unread_count: count,
            }),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Mark a single notification as read
///
/// Idempotent: marking an already-read notification succeeds with no effect.
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    tag = "notifications",
    params(
        ("id" = i64, Path, description = "The ID of the notification to mark as read")
    ),
    responses(
        (status = 204, description = "Notification marked as read"),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse),
        (status = 404, description = "Notification not found", body = NotificationErrorResponse),
        (status = 500, description = "Internal server error", body = NotificationErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_read(
    Path(notification_id): Path<i64>,
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service
        .mark_as_read(user.user_id, notification_id)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

/// Mark all of the authenticated user's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    tag = "notifications",
    responses(
        (status = 204, description = "All notifications marked as read"),
        (status = 401, description = "Unauthorized", body = NotificationErrorResponse),
        (status = 500, description = "Internal server error", body = NotificationErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn mark_all_read(
    Extension(user): Extension<AuthUser>,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> impl IntoResponse {
    match notification_service.mark_all_as_read(user.user_id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => notification_error_to_response(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, body) = notification_error_to_response(NotificationError::NotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, "NOT_FOUND");
    }

    #[test]
    fn test_database_error_maps_to_500_without_detail_leak() {
        let err = NotificationError::DatabaseError(sqlx::Error::RowNotFound);
        let (status, body) = notification_error_to_response(err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.0.error, "Database error");
        assert_eq!(body.0.code, "DB_ERROR");
    }
}
