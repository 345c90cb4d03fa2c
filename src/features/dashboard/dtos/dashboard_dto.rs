use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::cases::models::{CaseKind, CaseStatus};

/// Query params shared by the dashboard endpoints
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// complaint or apology
    pub kind: CaseKind,
}

/// Number of cases in one status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCountDto {
    pub status: CaseStatus,
    pub count: i64,
}

/// Per-status counts of one case kind, in lifecycle order
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusSummaryDto {
    pub kind: CaseKind,
    pub total: i64,
    pub statuses: Vec<StatusCountDto>,
}

/// Share of cases that reached the kind's successful outcome
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResolutionRateDto {
    pub kind: CaseKind,
    /// `resolved` for complaints, `accepted` for apologies
    pub success_status: CaseStatus,
    pub success_count: i64,
    pub total: i64,
    /// Percentage with two decimals; 0 when there are no cases
    pub rate: f64,
}

/// Cases still waiting in the kind's initial status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingCountDto {
    pub kind: CaseKind,
    pub status: CaseStatus,
    pub count: i64,
}
