use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ValidJson;
use crate::features::auth::guards::{RequireReviewer, RequireStudent};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::cases::dtos::{
    AppendTimelineDto, CaseResponseDto, CreateApologyDto, CreateComplaintDto, ListCasesQuery,
    StatusUpdateResponseDto, UpdateStatusDto,
};
use crate::features::cases::models::{CaseCategory, CaseKind, Priority, TimelineEntry};
use crate::features::cases::services::{AttachmentUpload, CaseService, CaseSubmission};
use crate::shared::constants::ATTACHMENTS_FIELD;
use crate::shared::types::{ApiResponse, Meta};

/// Text fields and files of a case submission form
#[derive(Default)]
struct CaseForm {
    fields: HashMap<String, String>,
    attachments: Vec<AttachmentUpload>,
}

impl CaseForm {
    fn text(&mut self, name: &str) -> String {
        self.fields.remove(name).unwrap_or_default()
    }

    fn optional(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .filter(|value| !value.trim().is_empty())
    }
}

async fn read_case_form(mut multipart: Multipart) -> Result<CaseForm> {
    let mut form = CaseForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == ATTACHMENTS_FIELD {
            let file_name = field.file_name().unwrap_or("attachment").to_string();
            let data = field.bytes().await.map_err(|e| {
                debug!("Failed to read attachment bytes: {}", e);
                AppError::BadRequest(format!("Failed to read attachment '{}': {}", file_name, e))
            })?;
            form.attachments.push(AttachmentUpload {
                file_name,
                data: data.to_vec(),
            });
        } else if !field_name.is_empty() {
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            form.fields.insert(field_name, text);
        }
    }

    Ok(form)
}

/// Submit a complaint
///
/// Accepts multipart/form-data with `title`, `category`, `description`,
/// optional `priority`, and any number of `attachments` image files.
#[utoipa::path(
    post,
    path = "/api/complaints",
    request_body(
        content = CreateComplaintDto,
        content_type = "multipart/form-data",
        description = "Complaint fields with optional image attachments",
    ),
    responses(
        (status = 201, description = "Complaint created", body = ApiResponse<CaseResponseDto>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Student access required"),
        (status = 415, description = "Attachment is not an accepted image")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn create_complaint(
    RequireStudent(user): RequireStudent,
    State(service): State<Arc<CaseService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<CaseResponseDto>>)> {
    let mut form = read_case_form(multipart).await?;
    let dto = CreateComplaintDto {
        title: form.text("title"),
        category: form.text("category"),
        description: form.text("description"),
        priority: form.optional("priority"),
        attachments: Vec::new(),
    };
    dto.validate()?;

    let submission = CaseSubmission {
        category: CaseCategory::parse(CaseKind::Complaint, &dto.category)?,
        title: Some(dto.title),
        description: dto.description,
        details: None,
        priority: dto
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        attachments: form.attachments,
    };

    let detail = service.create_case(user.user_id, submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(detail.into()),
            Some("Complaint submitted".to_string()),
            None,
        )),
    ))
}

/// Submit an apology
///
/// Accepts multipart/form-data with `type`, `message`, optional
/// `description`, and any number of `attachments` image files.
#[utoipa::path(
    post,
    path = "/api/apologies",
    request_body(
        content = CreateApologyDto,
        content_type = "multipart/form-data",
        description = "Apology fields with optional image attachments",
    ),
    responses(
        (status = 201, description = "Apology created", body = ApiResponse<CaseResponseDto>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Student access required"),
        (status = 415, description = "Attachment is not an accepted image")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn create_apology(
    RequireStudent(user): RequireStudent,
    State(service): State<Arc<CaseService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<CaseResponseDto>>)> {
    let mut form = read_case_form(multipart).await?;
    let dto = CreateApologyDto {
        category: form.text("type"),
        message: form.text("message"),
        description: form.optional("description"),
        attachments: Vec::new(),
    };
    dto.validate()?;

    let submission = CaseSubmission {
        category: CaseCategory::parse(CaseKind::Apology, &dto.category)?,
        title: None,
        description: dto.message,
        details: dto.description,
        priority: None,
        attachments: form.attachments,
    };

    let detail = service.create_case(user.user_id, submission).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(detail.into()),
            Some("Apology submitted".to_string()),
            None,
        )),
    ))
}

/// List cases visible to the caller
#[utoipa::path(
    get,
    path = "/api/cases",
    params(ListCasesQuery),
    responses(
        (status = 200, description = "Visible cases, newest first", body = ApiResponse<Vec<CaseResponseDto>>),
        (status = 400, description = "Invalid status filter"),
        (status = 403, description = "Role may not list cases")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn list_cases(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Query(query): Query<ListCasesQuery>,
) -> Result<Json<ApiResponse<Vec<CaseResponseDto>>>> {
    let cases = service
        .list_cases(&user, query.kind, query.status.as_deref())
        .await?;
    let meta = Meta::total(cases.len());
    let data = cases.into_iter().map(Into::into).collect();
    Ok(Json(ApiResponse::success(Some(data), None, Some(meta))))
}

/// Get a case with its attachments and timeline
#[utoipa::path(
    get,
    path = "/api/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Case found", body = ApiResponse<CaseResponseDto>),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn get_case(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CaseResponseDto>>> {
    let detail = service.get_case(&user, id).await?;
    Ok(Json(ApiResponse::success(Some(detail.into()), None, None)))
}

/// Change the status of a case (reviewers only)
///
/// The status change and its timeline entry commit together. If the owner
/// cannot be notified afterwards the change still stands and
/// `notification_error` explains what failed.
#[utoipa::path(
    put,
    path = "/api/cases/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = UpdateStatusDto,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<StatusUpdateResponseDto>),
        (status = 400, description = "Status not valid for this case"),
        (status = 403, description = "Case is outside the reviewer's block"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn update_case_status(
    RequireReviewer(user): RequireReviewer,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
    ValidJson(dto): ValidJson<UpdateStatusDto>,
) -> Result<Json<ApiResponse<StatusUpdateResponseDto>>> {
    let outcome = service
        .transition_status(&user, id, &dto.status, dto.comment.as_deref())
        .await?;

    let message = if outcome.notification_error.is_some() {
        "Status updated, but the owner could not be notified"
    } else {
        "Status updated"
    };

    let data = StatusUpdateResponseDto {
        case: outcome.detail.into(),
        timeline_entry: outcome.timeline_entry,
        notification: outcome.notification.map(Into::into),
        notification_error: outcome.notification_error.map(Into::into),
    };

    Ok(Json(ApiResponse::success(
        Some(data),
        Some(message.to_string()),
        None,
    )))
}

/// Delete a case with its attachments, timeline and notifications
#[utoipa::path(
    delete,
    path = "/api/cases/{id}",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Case deleted"),
        (status = 403, description = "Caller may not delete this case"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn delete_case(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_case(&user, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Case deleted".to_string()),
        None,
    )))
}

/// Add a note to a case's timeline
#[utoipa::path(
    post,
    path = "/api/cases/{id}/timeline",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    request_body = AppendTimelineDto,
    responses(
        (status = 201, description = "Entry appended", body = ApiResponse<TimelineEntry>),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn append_timeline(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
    ValidJson(dto): ValidJson<AppendTimelineDto>,
) -> Result<(StatusCode, Json<ApiResponse<TimelineEntry>>)> {
    let entry = service.append_timeline(&user, id, &dto.message).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(entry), None, None)),
    ))
}

/// List a case's timeline, oldest first
#[utoipa::path(
    get,
    path = "/api/cases/{id}/timeline",
    params(
        ("id" = Uuid, Path, description = "Case ID")
    ),
    responses(
        (status = 200, description = "Timeline entries", body = ApiResponse<Vec<TimelineEntry>>),
        (status = 404, description = "Case not found")
    ),
    security(("bearer_auth" = [])),
    tag = "cases"
)]
pub async fn list_timeline(
    user: AuthenticatedUser,
    State(service): State<Arc<CaseService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<TimelineEntry>>>> {
    let entries = service.list_timeline(&user, id).await?;
    let meta = Meta::total(entries.len());
    Ok(Json(ApiResponse::success(Some(entries), None, Some(meta))))
}
