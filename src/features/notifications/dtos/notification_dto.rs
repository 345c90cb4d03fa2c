use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::cases::models::CaseKind;
use crate::features::notifications::models::{Notification, NotificationCategory};

/// Response DTO for a notification
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponseDto {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub related_id: Option<Uuid>,
    pub related_kind: Option<CaseKind>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponseDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            category: n.category,
            related_id: n.related_id,
            related_kind: n.related_kind,
            is_read: n.is_read,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponseDto {
    pub updated: u64,
}
