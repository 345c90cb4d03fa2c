use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored attachment of a case
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct Attachment {
    pub id: Uuid,
    pub case_id: Uuid,
    pub file_name: String,
    /// Remote URL, or the locally served path when the remote upload failed
    pub url: String,
    /// Remote media identifier, present only when the upload succeeded
    pub public_id: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    /// Local copy kept as the source of truth after a failed upload
    #[serde(skip_serializing)]
    pub local_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Where the ingester left an attachment's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub id: Uuid,
    pub file_name: String,
    pub url: String,
    pub public_id: Option<String>,
    pub content_type: String,
    pub size_bytes: i64,
    pub local_path: Option<String>,
}
