use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::cases::models::CaseKind;

/// Severity tag shown by clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Info => "info",
            NotificationCategory::Success => "success",
            NotificationCategory::Warning => "warning",
            NotificationCategory::Error => "error",
        }
    }
}

impl std::str::FromStr for NotificationCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(NotificationCategory::Info),
            "success" => Ok(NotificationCategory::Success),
            "warning" => Ok(NotificationCategory::Warning),
            "error" => Ok(NotificationCategory::Error),
            other => Err(AppError::Persistence(format!(
                "Unknown notification category '{}'",
                other
            ))),
        }
    }
}

/// In-app notification owned by exactly one recipient
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_id: Option<Uuid>,
    pub related_kind: Option<CaseKind>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Notification waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_id: Option<Uuid>,
    pub related_kind: Option<CaseKind>,
}

#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub message: String,
    pub category: String,
    pub related_id: Option<Uuid>,
    pub related_kind: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let related_kind = row
            .related_kind
            .as_deref()
            .map(str::parse::<CaseKind>)
            .transpose()
            .map_err(|_| {
                AppError::Persistence(format!("Notification {} has invalid related kind", row.id))
            })?;

        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            title: row.title,
            message: row.message,
            category: row.category.parse()?,
            related_id: row.related_id,
            related_kind,
            is_read: row.is_read,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
