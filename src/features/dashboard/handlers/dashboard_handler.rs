use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::guards::RequireReviewer;
use crate::features::dashboard::dtos::*;
use crate::features::dashboard::services::DashboardService;
use crate::shared::types::ApiResponse;

/// Case counts per status for one kind
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Status summary", body = ApiResponse<StatusSummaryDto>),
        (status = 403, description = "Reviewer access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_status_summary(
    RequireReviewer(_user): RequireReviewer,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<StatusSummaryDto>>, AppError> {
    let summary = service.status_summary(query.kind).await?;
    Ok(Json(ApiResponse::success(Some(summary), None, None)))
}

/// Percentage of cases that reached a successful outcome
#[utoipa::path(
    get,
    path = "/api/dashboard/resolution-rate",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Resolution rate", body = ApiResponse<ResolutionRateDto>),
        (status = 403, description = "Reviewer access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_resolution_rate(
    RequireReviewer(_user): RequireReviewer,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<ResolutionRateDto>>, AppError> {
    let rate = service.resolution_rate(query.kind).await?;
    Ok(Json(ApiResponse::success(Some(rate), None, None)))
}

/// Cases still in their initial status
#[utoipa::path(
    get,
    path = "/api/dashboard/pending",
    tag = "dashboard",
    params(DashboardQuery),
    responses(
        (status = 200, description = "Pending count", body = ApiResponse<PendingCountDto>),
        (status = 403, description = "Reviewer access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_pending_count(
    RequireReviewer(_user): RequireReviewer,
    State(service): State<Arc<DashboardService>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<ApiResponse<PendingCountDto>>, AppError> {
    let pending = service.pending_count(query.kind).await?;
    Ok(Json(ApiResponse::success(Some(pending), None, None)))
}
