//! Case status values and the per-kind transition rules.
//!
//! Complaint: `open -> inprogress -> resolved`, with `open -> resolved` allowed.
//! Apology: `submitted -> reviewed -> accepted | rejected`, with a direct
//! `submitted -> accepted | rejected` allowed. Setting a case to its current
//! status is always legal and still produces a timeline entry.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::error::AppError;
use crate::features::cases::models::CaseKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Open,
    #[serde(alias = "in_progress")]
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 3] = [
        ComplaintStatus::Open,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Open => "open",
            ComplaintStatus::InProgress => "inprogress",
            ComplaintStatus::Resolved => "resolved",
        }
    }

    fn can_become(self, next: ComplaintStatus) -> bool {
        use ComplaintStatus::*;
        self == next || matches!((self, next), (Open, InProgress) | (Open | InProgress, Resolved))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApologyStatus {
    Submitted,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApologyStatus {
    pub const ALL: [ApologyStatus; 4] = [
        ApologyStatus::Submitted,
        ApologyStatus::Reviewed,
        ApologyStatus::Accepted,
        ApologyStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApologyStatus::Submitted => "submitted",
            ApologyStatus::Reviewed => "reviewed",
            ApologyStatus::Accepted => "accepted",
            ApologyStatus::Rejected => "rejected",
        }
    }

    fn can_become(self, next: ApologyStatus) -> bool {
        use ApologyStatus::*;
        self == next
            || matches!(
                (self, next),
                (Submitted, Reviewed) | (Submitted | Reviewed, Accepted | Rejected)
            )
    }
}

/// Status of a case; the variant always agrees with the case kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CaseStatus {
    Complaint(ComplaintStatus),
    Apology(ApologyStatus),
}

impl CaseStatus {
    pub fn initial(kind: CaseKind) -> Self {
        match kind {
            CaseKind::Complaint => CaseStatus::Complaint(ComplaintStatus::Open),
            CaseKind::Apology => CaseStatus::Apology(ApologyStatus::Submitted),
        }
    }

    /// The status counted as a successful outcome by the dashboard
    pub fn success(kind: CaseKind) -> Self {
        match kind {
            CaseKind::Complaint => CaseStatus::Complaint(ComplaintStatus::Resolved),
            CaseKind::Apology => CaseStatus::Apology(ApologyStatus::Accepted),
        }
    }

    /// Every status of `kind`, in lifecycle order
    pub fn all(kind: CaseKind) -> Vec<CaseStatus> {
        match kind {
            CaseKind::Complaint => ComplaintStatus::ALL
                .into_iter()
                .map(CaseStatus::Complaint)
                .collect(),
            CaseKind::Apology => ApologyStatus::ALL
                .into_iter()
                .map(CaseStatus::Apology)
                .collect(),
        }
    }

    pub fn kind(&self) -> CaseKind {
        match self {
            CaseStatus::Complaint(_) => CaseKind::Complaint,
            CaseStatus::Apology(_) => CaseKind::Apology,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Complaint(s) => s.as_str(),
            CaseStatus::Apology(s) => s.as_str(),
        }
    }

    /// Parse a wire or stored status value for the given kind.
    ///
    /// Values belonging to the other kind are rejected.
    pub fn parse(kind: CaseKind, raw: &str) -> Result<Self, AppError> {
        let value = serde_json::Value::String(raw.trim().to_lowercase());
        let parsed = match kind {
            CaseKind::Complaint => {
                serde_json::from_value::<ComplaintStatus>(value).map(CaseStatus::Complaint)
            }
            CaseKind::Apology => {
                serde_json::from_value::<ApologyStatus>(value).map(CaseStatus::Apology)
            }
        };
        parsed.map_err(|_| {
            let allowed: Vec<&str> = Self::all(kind).iter().map(|s| s.as_str()).collect();
            AppError::Validation(format!(
                "Invalid {} status '{}'. Allowed: {}",
                kind,
                raw.trim(),
                allowed.join(", ")
            ))
        })
    }

    /// Check that moving from `self` to `next` is a legal transition
    pub fn ensure_transition(self, next: CaseStatus) -> Result<(), AppError> {
        let legal = match (self, next) {
            (CaseStatus::Complaint(from), CaseStatus::Complaint(to)) => from.can_become(to),
            (CaseStatus::Apology(from), CaseStatus::Apology(to)) => from.can_become(to),
            _ => false,
        };

        if legal {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Cannot change {} status from {} to {}",
                self.kind(),
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
