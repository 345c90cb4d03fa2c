use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::accounts::handlers;
use crate::features::accounts::services::ProfileService;

pub fn routes(service: Arc<ProfileService>) -> Router {
    Router::new()
        .route("/api/student/profile", get(handlers::get_own_profile))
        .route(
            "/api/admin/student/{student_identifier}",
            get(handlers::get_student_profile),
        )
        .with_state(service)
}
