use std::sync::Arc;

use axum::{
    routing::{delete, get, patch},
    Router,
};

use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationService;

/// Create routes for the notifications inbox
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/read-all",
            patch(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/{id}/read",
            patch(handlers::mark_notification_read),
        )
        .route(
            "/api/notifications/{id}",
            delete(handlers::delete_notification),
        )
        .with_state(service)
}
