use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::cases::models::{
    Attachment, CaseCategory, CaseKind, CaseStatus, Priority, TimelineEntry,
};
use crate::features::cases::services::{CaseDetail, NotificationFailure};
use crate::features::notifications::dtos::NotificationResponseDto;

/// Text fields of a complaint submission (multipart form)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateComplaintDto {
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,

    /// roommate, plumbing, cleanliness, electricity, lost_and_found, other_issues
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required (max 5000 characters)"))]
    pub description: String,

    /// low, medium (default) or high
    pub priority: Option<String>,

    /// Image files (JPEG by default), sent as repeated `attachments` parts
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Text fields of an apology submission (multipart form)
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateApologyDto {
    /// outing, misconduct or miscellaneous
    #[validate(length(min = 1, message = "Apology type is required"))]
    #[serde(rename = "type")]
    pub category: String,

    #[validate(length(min = 1, max = 5000, message = "Message is required (max 5000 characters)"))]
    pub message: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    /// Image files (JPEG by default), sent as repeated `attachments` parts
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Request body for a status change
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusDto {
    /// Status value of the case's kind, e.g. `inprogress` or `accepted`
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,

    /// Reviewer comment stored on the case
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Request body for a timeline post
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AppendTimelineDto {
    #[validate(length(min = 1, max = 2000, message = "Message is required (max 2000 characters)"))]
    pub message: String,
}

/// Query parameters for listing cases
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCasesQuery {
    /// complaint or apology
    pub kind: Option<CaseKind>,
    /// Status value; matched against the given kind, or either kind when omitted
    pub status: Option<String>,
}

/// Response DTO for a case
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CaseResponseDto {
    pub id: Uuid,
    pub kind: CaseKind,
    pub owner_id: Uuid,
    pub student_id: Option<String>,
    pub block: Option<String>,
    pub category: CaseCategory,
    pub title: Option<String>,
    pub description: String,
    pub details: Option<String>,
    pub status: CaseStatus,
    pub priority: Option<Priority>,
    pub comment: Option<String>,
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CaseDetail> for CaseResponseDto {
    fn from(detail: CaseDetail) -> Self {
        let c = detail.case;
        Self {
            id: c.id,
            kind: c.kind,
            owner_id: c.owner_id,
            student_id: c.student_identifier,
            block: c.owner_block,
            category: c.category,
            title: c.title,
            description: c.description,
            details: c.details,
            status: c.status,
            priority: c.priority,
            comment: c.comment,
            attachments: detail.attachments,
            timeline: detail.timeline,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Result of a status change
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusUpdateResponseDto {
    pub case: CaseResponseDto,
    pub timeline_entry: TimelineEntry,
    /// Owner notification, when the new status has one
    pub notification: Option<NotificationResponseDto>,
    /// Set when the status changed but the owner could not be notified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<NotificationFailureDto>,
}

/// Non-fatal notification failure reported next to a committed status change
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationFailureDto {
    /// Machine-readable kind, e.g. `notification_delivery_error`
    pub error: String,
    pub message: String,
}

impl From<NotificationFailure> for NotificationFailureDto {
    fn from(failure: NotificationFailure) -> Self {
        Self {
            error: failure.kind.to_string(),
            message: failure.message,
        }
    }
}
