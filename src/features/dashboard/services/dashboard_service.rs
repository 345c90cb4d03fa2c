use std::sync::Arc;

use crate::core::error::Result;
use crate::features::cases::models::{CaseKind, CaseStatus};
use crate::features::dashboard::dtos::{
    PendingCountDto, ResolutionRateDto, StatusCountDto, StatusSummaryDto,
};
use crate::modules::store::CaseStore;

/// Facility-wide case metrics for reviewers
pub struct DashboardService {
    store: Arc<dyn CaseStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// Counts for every status of `kind`, zero-filled, in lifecycle order
    pub async fn status_summary(&self, kind: CaseKind) -> Result<StatusSummaryDto> {
        let counts = self.store.count_cases_by_status(kind).await?;

        let statuses: Vec<StatusCountDto> = CaseStatus::all(kind)
            .into_iter()
            .map(|status| StatusCountDto {
                status,
                count: counts
                    .iter()
                    .find(|(s, _)| *s == status)
                    .map_or(0, |(_, n)| *n),
            })
            .collect();
        let total = statuses.iter().map(|s| s.count).sum();

        Ok(StatusSummaryDto {
            kind,
            total,
            statuses,
        })
    }

    pub async fn resolution_rate(&self, kind: CaseKind) -> Result<ResolutionRateDto> {
        let summary = self.status_summary(kind).await?;
        let success_status = CaseStatus::success(kind);
        let success_count = count_of(&summary, success_status);

        let rate = if summary.total == 0 {
            0.0
        } else {
            let percent = success_count as f64 / summary.total as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        };

        Ok(ResolutionRateDto {
            kind,
            success_status,
            success_count,
            total: summary.total,
            rate,
        })
    }

    pub async fn pending_count(&self, kind: CaseKind) -> Result<PendingCountDto> {
        let summary = self.status_summary(kind).await?;
        let status = CaseStatus::initial(kind);

        Ok(PendingCountDto {
            kind,
            status,
            count: count_of(&summary, status),
        })
    }
}

fn count_of(summary: &StatusSummaryDto, status: CaseStatus) -> i64 {
    summary
        .statuses
        .iter()
        .find(|s| s.status == status)
        .map_or(0, |s| s.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::model::{AuthenticatedUser, Role};
    use crate::features::cases::models::{CaseCategory, ComplaintCategory, ComplaintStatus};
    use crate::features::cases::services::CaseSubmission;
    use crate::shared::test_helpers::{as_user, case_service, MemoryCaseStore};

    fn complaint() -> CaseSubmission {
        CaseSubmission {
            category: CaseCategory::Complaint(ComplaintCategory::Electricity),
            title: Some("Fan broken".to_string()),
            description: "Ceiling fan does not turn".to_string(),
            details: None,
            priority: None,
            attachments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_empty_store_reports_zero() {
        let service = DashboardService::new(Arc::new(MemoryCaseStore::new()));

        let summary = service.status_summary(CaseKind::Apology).await.unwrap();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.statuses.len(), 4);
        assert!(summary.statuses.iter().all(|s| s.count == 0));

        let rate = service.resolution_rate(CaseKind::Apology).await.unwrap();
        assert_eq!(rate.rate, 0.0);
        assert_eq!(rate.success_status.as_str(), "accepted");
    }

    #[tokio::test]
    async fn test_metrics_follow_case_statuses() {
        let store = MemoryCaseStore::new();
        let student = store.add_student("A").await;
        let chief = store.add_account(Role::ChiefAdmin, None).await;
        let dir = tempfile::tempdir().unwrap();
        let cases = case_service(&store, dir.path());
        let actor: AuthenticatedUser = as_user(&chief);

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(cases.create_case(student.id, complaint()).await.unwrap().case.id);
        }
        cases
            .transition_status(&actor, ids[0], "resolved", None)
            .await
            .unwrap();
        cases
            .transition_status(&actor, ids[1], "inprogress", None)
            .await
            .unwrap();

        let service = DashboardService::new(Arc::new(store));

        let summary = service.status_summary(CaseKind::Complaint).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(
            summary.statuses[1],
            StatusCountDto {
                status: CaseStatus::Complaint(ComplaintStatus::InProgress),
                count: 1
            }
        );

        let rate = service.resolution_rate(CaseKind::Complaint).await.unwrap();
        assert_eq!(rate.success_count, 1);
        assert_eq!(rate.rate, 33.33);

        let pending = service.pending_count(CaseKind::Complaint).await.unwrap();
        assert_eq!(pending.status.as_str(), "open");
        assert_eq!(pending.count, 1);
    }
}
