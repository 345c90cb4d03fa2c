use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::model::Role;
use crate::features::cases::models::{
    ApologyCategory, ApologyStatus, Attachment, CaseCategory, CaseKind, CaseStatus,
    ComplaintCategory, ComplaintStatus, Priority, TimelineEntry,
};
use crate::features::cases::{dtos as cases_dtos, handlers as cases_handlers};
use crate::features::accounts::{dtos as accounts_dtos, handlers as accounts_handlers};
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::notifications::models::NotificationCategory;
use crate::features::notifications::{
    dtos as notifications_dtos, handlers as notifications_handlers,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Cases
        cases_handlers::create_complaint,
        cases_handlers::create_apology,
        cases_handlers::list_cases,
        cases_handlers::get_case,
        cases_handlers::update_case_status,
        cases_handlers::delete_case,
        cases_handlers::append_timeline,
        cases_handlers::list_timeline,
        // Notifications
        notifications_handlers::list_notifications,
        notifications_handlers::mark_notification_read,
        notifications_handlers::mark_all_notifications_read,
        notifications_handlers::delete_notification,
        // Dashboard (reviewers)
        dashboard_handlers::get_status_summary,
        dashboard_handlers::get_resolution_rate,
        dashboard_handlers::get_pending_count,
        accounts_handlers::get_own_profile,
        accounts_handlers::get_student_profile,
    ),
    components(
        schemas(
            Meta,
            Role,
            // Case models
            CaseKind,
            CaseCategory,
            ComplaintCategory,
            ApologyCategory,
            CaseStatus,
            ComplaintStatus,
            ApologyStatus,
            Priority,
            Attachment,
            TimelineEntry,
            // Case DTOs
            cases_dtos::CreateComplaintDto,
            cases_dtos::CreateApologyDto,
            cases_dtos::UpdateStatusDto,
            cases_dtos::AppendTimelineDto,
            cases_dtos::CaseResponseDto,
            cases_dtos::StatusUpdateResponseDto,
            cases_dtos::NotificationFailureDto,
            // Notification DTOs
            NotificationCategory,
            notifications_dtos::NotificationResponseDto,
            notifications_dtos::MarkAllReadResponseDto,
            // Dashboard DTOs
            dashboard_dtos::StatusCountDto,
            dashboard_dtos::StatusSummaryDto,
            dashboard_dtos::ResolutionRateDto,
            dashboard_dtos::PendingCountDto,
            accounts_dtos::StudentProfileResponseDto,
            // Response wrappers
            ApiResponse<cases_dtos::CaseResponseDto>,
            ApiResponse<Vec<cases_dtos::CaseResponseDto>>,
            ApiResponse<cases_dtos::StatusUpdateResponseDto>,
            ApiResponse<TimelineEntry>,
            ApiResponse<Vec<TimelineEntry>>,
            ApiResponse<notifications_dtos::NotificationResponseDto>,
            ApiResponse<Vec<notifications_dtos::NotificationResponseDto>>,
            ApiResponse<notifications_dtos::MarkAllReadResponseDto>,
            ApiResponse<dashboard_dtos::StatusSummaryDto>,
            ApiResponse<dashboard_dtos::ResolutionRateDto>,
            ApiResponse<dashboard_dtos::PendingCountDto>,
            ApiResponse<accounts_dtos::StudentProfileResponseDto>,
        )
    ),
    tags(
        (name = "cases", description = "Complaints, apologies, review transitions and timelines"),
        (name = "notifications", description = "Per-account notification inbox"),
        (name = "dashboard", description = "Case metrics for reviewers"),
        (name = "accounts", description = "Student profiles"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Hostel Cases API",
        version = "0.1.0",
        description = "Complaint and apology lifecycle with staff notifications",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_case_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/complaints",
            "/api/cases/{id}/status",
            "/api/notifications/{id}/read",
            "/api/dashboard/summary",
            "/api/student/profile",
            "/api/admin/student/{student_identifier}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
        let schemes = doc
            .components
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false);
        assert!(schemes);
    }
}
