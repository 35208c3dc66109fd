use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CodeTok Social Backend API",
        version = "0.1.0",
        description = "REST API for CodeTok's social graph and engagement module"
    ),
    paths(
        // Health check endpoints
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        // Engagement endpoints
        crate::engagement::controller::toggle_like,
        crate::engagement::controller::toggle_favorite,
        crate::engagement::controller::toggle_follow,
        crate::engagement::controller::record_share,
        crate::engagement::controller::engagement_status,
        crate::engagement::controller::follow_stats,
        // Comment endpoints
        crate::comment::controller::create_comment,
        crate::comment::controller::get_project_comments,
        // Notification endpoints
        crate::notification::controller::list_notifications,
        crate::notification::controller::unread_count,
        crate::notification::controller::mark_read,
        crate::notification::controller::mark_all_read
    ),
    components(
        schemas(
            // Health schemas
            crate::routes::health::HealthResponse,
            // Engagement schemas
            crate::engagement::model::ToggleLikeResponse,
            crate::engagement::model::ToggleFavoriteResponse,
            crate::engagement::model::ToggleFollowResponse,
            crate::engagement::model::ShareRequest,
            crate::engagement::model::EngagementStatusResponse,
            crate::engagement::model::FollowStatsResponse,
            crate::engagement::model::EngagementErrorResponse,
            // Comment schemas
            crate::comment::model::CreateCommentRequest,
            crate::comment::model::CommentAuthor,
            crate::comment::model::CommentResponse,
            crate::comment::model::CommentsListResponse,
            crate::comment::model::CommentErrorResponse,
            // Notification schemas
            crate::notification::model::NotificationType,
            crate::notification::model::ActorBrief,
            crate::notification::model::ProjectSnippet,
            crate::notification::model::CommentSnippet,
            crate::notification::model::NotificationResponse,
            crate::notification::model::NotificationListResponse,
            crate::notification::model::UnreadCountResponse,
            crate::notification::model::NotificationErrorResponse,
            // Shared wrappers
            crate::schema_ext::UuidWrapper,
            crate::schema_ext::DateTimeWrapper
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "engagement", description = "Likes, favorites, follows and shares"),
        (name = "comments", description = "Project comment threads"),
        (name = "notifications", description = "Engagement notifications")
    )
)]
pub struct ApiDoc;
