use crate::auth::middleware::auth_middleware;
use crate::notification::controller::{
    list_notifications, mark_all_read, mark_read, unread_count,
};
use crate::notification::service::NotificationService;
use axum::{
    middleware,
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

/// Create a router for notification routes; everything here is private
/// to the authenticated recipient.
pub fn routes(notification_service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/:id/read", patch(mark_read))
        .route("/api/notifications/read-all", patch(mark_all_read))
        .layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(notification_service))
}
