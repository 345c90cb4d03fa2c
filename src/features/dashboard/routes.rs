use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::dashboard::handlers;
use crate::features::dashboard::services::DashboardService;

/// Create reviewer dashboard routes
pub fn routes(dashboard_service: Arc<DashboardService>) -> Router {
    Router::new()
        .route("/api/dashboard/summary", get(handlers::get_status_summary))
        .route(
            "/api/dashboard/resolution-rate",
            get(handlers::get_resolution_rate),
        )
        .route("/api/dashboard/pending", get(handlers::get_pending_count))
        .with_state(dashboard_service)
}
