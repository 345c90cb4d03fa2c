//! Role-based authorization guards for the application.
//!
//! These guards extract the authenticated user and verify the role class.
//! Block scoping is not decided here; services apply it per case through
//! the rules in [`crate::features::auth::policy`].

use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Role};
use axum::{extract::FromRequestParts, http::request::Parts};

fn authenticated(parts: &Parts) -> Result<AuthenticatedUser, AppError> {
    parts
        .extensions
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))
}

/// Guard for submitter endpoints.
///
/// Only allows users with the "student" role.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireStudent(user): RequireStudent) { ... }
/// ```
pub struct RequireStudent(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireStudent
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if user.role != Role::Student {
            return Err(AppError::Forbidden("Student access required".to_string()));
        }

        Ok(RequireStudent(user))
    }
}

/// Guard for reviewer endpoints.
///
/// Allows "admin" and "chief_admin".
pub struct RequireReviewer(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireReviewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticated(parts)?;

        if !user.role.is_reviewer() {
            return Err(AppError::Forbidden(
                "Forbidden: insufficient privileges".to_string(),
            ));
        }

        Ok(RequireReviewer(user))
    }
}
