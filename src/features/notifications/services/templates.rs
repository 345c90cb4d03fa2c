//! Fixed notification texts keyed by case event.

use crate::features::cases::models::{ApologyStatus, Case, CaseKind, CaseStatus, ComplaintStatus};
use crate::features::notifications::models::{NewNotification, NotificationCategory};
use crate::shared::constants::{NEW_APOLOGY_TITLE, NEW_COMPLAINT_TITLE};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub title: &'static str,
    pub message: &'static str,
    pub category: NotificationCategory,
}

/// Owner-facing template for a status change; `None` means no notification
pub fn transition_template(status: CaseStatus) -> Option<Template> {
    use NotificationCategory::*;

    let (title, message, category) = match status {
        CaseStatus::Complaint(ComplaintStatus::InProgress) => (
            "Complaint In Progress",
            "Your complaint is now being reviewed by the warden.",
            Info,
        ),
        CaseStatus::Complaint(ComplaintStatus::Resolved) => (
            "Complaint Resolved",
            "Your complaint has been resolved. Please check for updates.",
            Success,
        ),
        CaseStatus::Apology(ApologyStatus::Reviewed) => (
            "Apology Under Review",
            "Your apology letter is being reviewed by the warden.",
            Info,
        ),
        CaseStatus::Apology(ApologyStatus::Accepted) => (
            "Apology Accepted",
            "Your apology has been accepted.",
            Success,
        ),
        CaseStatus::Apology(ApologyStatus::Rejected) => (
            "Apology Rejected",
            "Your apology has been rejected. Please contact the warden for details.",
            Warning,
        ),
        CaseStatus::Complaint(ComplaintStatus::Open)
        | CaseStatus::Apology(ApologyStatus::Submitted) => return None,
    };

    Some(Template {
        title,
        message,
        category,
    })
}

/// Notification for the owner of `case` after a status change
pub fn transition_notification(case: &Case) -> Option<NewNotification> {
    transition_template(case.status).map(|t| NewNotification {
        recipient_id: case.owner_id,
        title: t.title.to_string(),
        message: t.message.to_string(),
        category: t.category,
        related_id: Some(case.id),
        related_kind: Some(case.kind),
    })
}

/// Staff notification announcing a new case
pub fn creation_notification(case: &Case, recipient_id: Uuid) -> NewNotification {
    let (title, message) = match case.kind {
        CaseKind::Complaint => (
            NEW_COMPLAINT_TITLE,
            format!(
                "A student has submitted a complaint: {}",
                case.title.as_deref().unwrap_or(&case.description)
            ),
        ),
        CaseKind::Apology => (
            NEW_APOLOGY_TITLE,
            format!("A student has submitted an apology: {}", case.description),
        ),
    };

    NewNotification {
        recipient_id,
        title: title.to_string(),
        message,
        category: NotificationCategory::Info,
        related_id: Some(case.id),
        related_kind: Some(case.kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_statuses_have_no_template() {
        assert!(transition_template(CaseStatus::initial(CaseKind::Complaint)).is_none());
        assert!(transition_template(CaseStatus::initial(CaseKind::Apology)).is_none());
    }

    #[test]
    fn test_template_categories() {
        let resolved = transition_template(CaseStatus::Complaint(ComplaintStatus::Resolved));
        assert_eq!(resolved.unwrap().category, NotificationCategory::Success);

        let rejected = transition_template(CaseStatus::Apology(ApologyStatus::Rejected)).unwrap();
        assert_eq!(rejected.title, "Apology Rejected");
        assert_eq!(rejected.category, NotificationCategory::Warning);
    }
}
