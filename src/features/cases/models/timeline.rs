use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only audit entry of a case
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub case_id: Uuid,
    /// `<role>:<actor id>`
    pub author: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub fn status_changed_message(status: &str) -> String {
    format!("Status changed to {}", status)
}
