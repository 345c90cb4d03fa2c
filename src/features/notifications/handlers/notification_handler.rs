use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::notifications::dtos::{MarkAllReadResponseDto, NotificationResponseDto};
use crate::features::notifications::services::NotificationService;
use crate::shared::types::{ApiResponse, Meta};

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    responses(
        (status = 200, description = "Caller's notifications with total and unread count", body = ApiResponse<Vec<NotificationResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn list_notifications(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<Vec<NotificationResponseDto>>>> {
    let (notifications, unread) = service.list(user.user_id).await?;
    let meta = Meta {
        total: notifications.len() as i64,
        unread: Some(unread),
    };
    let data = notifications.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(Some(data), None, Some(meta))))
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = ApiResponse<NotificationResponseDto>),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<NotificationResponseDto>>> {
    let notification = service.mark_read(id, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(notification.into()),
        Some("Notification marked as read".to_string()),
        None,
    )))
}

/// Mark all of the caller's notifications as read
#[utoipa::path(
    patch,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "Notifications marked as read", body = ApiResponse<MarkAllReadResponseDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_all_notifications_read(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<MarkAllReadResponseDto>>> {
    let updated = service.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(MarkAllReadResponseDto { updated }),
        Some("All notifications marked as read".to_string()),
        None,
    )))
}

/// Delete one of the caller's notifications
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn delete_notification(
    user: AuthenticatedUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, user.user_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Notification deleted".to_string()),
        None,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::Role;
    use crate::features::notifications::models::{NewNotification, NotificationCategory};
    use crate::features::notifications::routes;
    use crate::modules::store::CaseStore;
    use crate::shared::test_helpers::{as_user, with_user, MemoryCaseStore};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    fn note(recipient_id: Uuid, title: &str) -> NewNotification {
        NewNotification {
            recipient_id,
            title: title.to_string(),
            message: "body".to_string(),
            category: NotificationCategory::Info,
            related_id: None,
            related_kind: None,
        }
    }

    #[tokio::test]
    async fn test_inbox_round_trip() {
        let store = MemoryCaseStore::new();
        let admin = store.add_account(Role::Admin, Some("A")).await;
        let other = store.add_account(Role::Admin, Some("B")).await;
        let first = store.insert_notification(note(admin.id, "first")).await.unwrap();
        store.insert_notification(note(admin.id, "second")).await.unwrap();
        let foreign = store.insert_notification(note(other.id, "foreign")).await.unwrap();

        let service = Arc::new(NotificationService::new(Arc::new(store.clone())));
        let server = TestServer::new(with_user(routes(service), as_user(&admin))).unwrap();

        let body: Value = server.get("/api/notifications").await.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["meta"]["total"], 2);
        assert_eq!(body["meta"]["unread"], 2);
        assert_eq!(body["data"][0]["title"], "second");
        assert_eq!(body["data"][0]["type"], "info");

        server
            .patch(&format!("/api/notifications/{}/read", foreign.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let read = server
            .patch(&format!("/api/notifications/{}/read", first.id))
            .await;
        read.assert_status_ok();
        assert_eq!(read.json::<Value>()["data"]["is_read"], true);

        let all: Value = server.patch("/api/notifications/read-all").await.json();
        assert_eq!(all["data"]["updated"], 1);

        server
            .delete(&format!("/api/notifications/{}", first.id))
            .await
            .assert_status_ok();

        let body: Value = server.get("/api/notifications").await.json();
        assert_eq!(body["meta"]["total"], 1);
        assert_eq!(body["meta"]["unread"], 0);

        let state = store.snapshot().await;
        assert_eq!(state.notifications_for(other.id).len(), 1);
    }
}
