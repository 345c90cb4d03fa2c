use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::cases::handlers;
use crate::features::cases::services::CaseService;

/// Create routes for complaints, apologies and their shared case endpoints
///
/// `max_body_size` bounds the multipart submission endpoints.
pub fn routes(service: Arc<CaseService>, max_body_size: usize) -> Router {
    Router::new()
        .route(
            "/api/complaints",
            post(handlers::create_complaint).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route(
            "/api/apologies",
            post(handlers::create_apology).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/api/cases", get(handlers::list_cases))
        .route(
            "/api/cases/{id}",
            get(handlers::get_case).delete(handlers::delete_case),
        )
        .route("/api/cases/{id}/status", put(handlers::update_case_status))
        .route(
            "/api/cases/{id}/timeline",
            get(handlers::list_timeline).post(handlers::append_timeline),
        )
        .with_state(service)
}
