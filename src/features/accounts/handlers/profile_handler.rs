use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::accounts::dtos::StudentProfileResponseDto;
use crate::features::accounts::services::ProfileService;
use crate::features::auth::guards::{RequireReviewer, RequireStudent};
use crate::shared::types::ApiResponse;

#[utoipa::path(
    get,
    path = "/api/student/profile",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<StudentProfileResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Student access required"),
        (status = 404, description = "User not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_own_profile(
    RequireStudent(user): RequireStudent,
    State(service): State<Arc<ProfileService>>,
) -> Result<Json<ApiResponse<StudentProfileResponseDto>>> {
    let profile = service.own_profile(&user).await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}

/// Look up a student by their external identifier
#[utoipa::path(
    get,
    path = "/api/admin/student/{student_identifier}",
    params(
        ("student_identifier" = String, Path, description = "Student identifier such as a roll number")
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<StudentProfileResponseDto>),
        (status = 403, description = "Reviewer access required"),
        (status = 404, description = "Student not found")
    ),
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_student_profile(
    RequireReviewer(user): RequireReviewer,
    State(service): State<Arc<ProfileService>>,
    Path(student_identifier): Path<String>,
) -> Result<Json<ApiResponse<StudentProfileResponseDto>>> {
    let profile = service
        .profile_by_identifier(&user, &student_identifier)
        .await?;
    Ok(Json(ApiResponse::success(Some(profile), None, None)))
}
