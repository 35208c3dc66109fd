use crate::auth::middleware::AuthUser;
use crate::comment::model::{
    CommentError, CommentErrorResponse, CommentResponse, CommentsListResponse,
    CreateCommentRequest,
};
use crate::comment::service::CommentService;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// Helper function to convert CommentError to HTTP response
fn comment_error_to_response(err: CommentError) -> (StatusCode, Json<CommentErrorResponse>) {
    let (status, error_message, code) = match err {
        CommentError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "DB_ERROR",
            )
        }
        CommentError::ProjectNotFound => (
            StatusCode::NOT_FOUND,
            "Project not found",
            "PROJECT_NOT_FOUND",
        ),
        CommentError::ParentCommentNotFound => (
            StatusCode::NOT_FOUND,
            "Parent comment not found",
            "PARENT_NOT_FOUND",
        ),
        CommentError::ParentProjectMismatch => (
            StatusCode::BAD_REQUEST,
            "Parent comment belongs to a different project",
            "PARENT_MISMATCH",
        ),
        CommentError::ReplyDepthExceeded => (
            StatusCode::BAD_REQUEST,
            "Replies to replies are not allowed",
            "MAX_DEPTH",
        ),
        CommentError::ValidationError(_) => {
            (StatusCode::BAD_REQUEST, "Invalid input", "VALIDATION_ERROR")
        }
    };

    let error_response = CommentErrorResponse {
        error: error_message.to_string(),
        code: code.to_string(),
    };

    (status, Json(error_response))
}

/// Create a new comment on a project
///
/// Adds a top-level comment, or a reply when parent_comment_id is given.
#[utoipa::path(
    post,
    path = "/api/projects/{id}/comments",
    tag = "comments",
    params(
        ("id" = String, Path, description = "The ID of the project to comment on")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 400, description = "Invalid input", body = CommentErrorResponse),
        (status = 401, description = "Unauthorized", body = CommentErrorResponse),
        (status = 404, description = "Project or parent comment not found", body = CommentErrorResponse),
        (status = 500, description = "Internal server error", body = CommentErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_comment(
    Path(project_id): Path<Uuid>,
    Extension(user): Extension<AuthUser>,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Json(comment_data): Json<CreateCommentRequest>,
) -> impl IntoResponse {
    info!(
        "Creating comment for project: {}, user: {}",
        project_id, user.user_id
    );

    match comment_service
        .create_comment(user.user_id, project_id, comment_data)
        .await
    {
        Ok(comment) => {
            info!("Successfully created comment with ID: {}", comment.id);
            (StatusCode::CREATED, Json(comment)).into_response()
        }
        Err(e) => comment_error_to_response(e).into_response(),
    }
}

/// Get the comment thread for a project
///
/// Returns top-level comments newest-first, each with its direct replies.
#[utoipa::path(
    get,
    path = "/api/projects/{id}/comments",
    tag = "comments",
    params(
        ("id" = String, Path, description = "The ID of the project to get comments for")
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = CommentsListResponse),
        (status = 404, description = "Project not found", body = CommentErrorResponse),
        (status = 500, description = "Internal server error", body = CommentErrorResponse)
    )
)]
pub async fn get_project_comments(
    Path(project_id): Path<Uuid>,
    Extension(comment_service): Extension<Arc<CommentService>>,
) -> impl IntoResponse {
    match comment_service.get_project_comments(project_id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Error getting comments: {:?}", e);
            comment_error_to_response(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_maps_to_400() {
        let err = CommentError::ValidationError("empty".to_string());
        let (status, body) = comment_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "VALIDATION_ERROR");
    }

    #[test]
    fn test_depth_violation_maps_to_400() {
        let (status, body) = comment_error_to_response(CommentError::ReplyDepthExceeded);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "MAX_DEPTH");
    }

    #[test]
    fn test_not_found_variants_map_to_404() {
        let (status, body) = comment_error_to_response(CommentError::ProjectNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, "PROJECT_NOT_FOUND");

        let (status, body) = comment_error_to_response(CommentError::ParentCommentNotFound);
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.0.code, "PARENT_NOT_FOUND");
    }

    #[test]
    fn test_parent_mismatch_maps_to_400() {
        let (status, body) = comment_error_to_response(CommentError::ParentProjectMismatch);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.code, "PARENT_MISMATCH");
    }
}
