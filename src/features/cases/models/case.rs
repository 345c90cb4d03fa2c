use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::cases::models::CaseStatus;

/// Discriminant shared by complaints and apologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    Complaint,
    Apology,
}

impl CaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseKind::Complaint => "complaint",
            CaseKind::Apology => "apology",
        }
    }

    /// Directory / remote folder namespace for this kind's attachments
    pub fn storage_namespace(&self) -> &'static str {
        match self {
            CaseKind::Complaint => "complaints",
            CaseKind::Apology => "apologies",
        }
    }
}

impl std::fmt::Display for CaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaseKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complaint" => Ok(CaseKind::Complaint),
            "apology" => Ok(CaseKind::Apology),
            other => Err(AppError::Validation(format!(
                "Invalid case kind '{}'. Expected complaint or apology",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintCategory {
    Roommate,
    Plumbing,
    Cleanliness,
    Electricity,
    #[serde(alias = "Lost and Found")]
    LostAndFound,
    #[serde(alias = "Other Issues")]
    OtherIssues,
}

impl ComplaintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintCategory::Roommate => "roommate",
            ComplaintCategory::Plumbing => "plumbing",
            ComplaintCategory::Cleanliness => "cleanliness",
            ComplaintCategory::Electricity => "electricity",
            ComplaintCategory::LostAndFound => "lost_and_found",
            ComplaintCategory::OtherIssues => "other_issues",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApologyCategory {
    Outing,
    Misconduct,
    Miscellaneous,
}

impl ApologyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApologyCategory::Outing => "outing",
            ApologyCategory::Misconduct => "misconduct",
            ApologyCategory::Miscellaneous => "miscellaneous",
        }
    }
}

/// Category of a case; the variant always agrees with the case kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CaseCategory {
    Complaint(ComplaintCategory),
    Apology(ApologyCategory),
}

impl CaseCategory {
    pub fn kind(&self) -> CaseKind {
        match self {
            CaseCategory::Complaint(_) => CaseKind::Complaint,
            CaseCategory::Apology(_) => CaseKind::Apology,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Complaint(c) => c.as_str(),
            CaseCategory::Apology(c) => c.as_str(),
        }
    }

    /// Parse a stored or submitted category for the given kind
    pub fn parse(kind: CaseKind, raw: &str) -> Result<Self, AppError> {
        let value = serde_json::Value::String(raw.trim().to_string());
        let parsed = match kind {
            CaseKind::Complaint => {
                serde_json::from_value::<ComplaintCategory>(value).map(CaseCategory::Complaint)
            }
            CaseKind::Apology => {
                serde_json::from_value::<ApologyCategory>(value).map(CaseCategory::Apology)
            }
        };
        parsed.map_err(|_| {
            AppError::Validation(format!("Invalid {} category '{}'", kind, raw.trim()))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(AppError::Validation(format!(
                "Invalid priority '{}'. Expected low, medium or high",
                other
            ))),
        }
    }
}

/// A complaint or apology
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Case {
    pub id: Uuid,
    pub kind: CaseKind,
    pub owner_id: Uuid,
    /// External student identifier (roll number), denormalized at creation
    pub student_identifier: Option<String>,
    /// Owner's block, read from the student profile
    pub owner_block: Option<String>,
    pub category: CaseCategory,
    /// Complaint title; apologies have none
    pub title: Option<String>,
    /// Complaint description or apology message
    pub description: String,
    /// Apology's extended description
    pub details: Option<String>,
    pub status: CaseStatus,
    /// Complaints only
    pub priority: Option<Priority>,
    /// Reviewer comment, set on transition
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a case row that does not exist yet
#[derive(Debug, Clone)]
pub struct NewCase {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub student_identifier: Option<String>,
    pub category: CaseCategory,
    pub title: Option<String>,
    pub description: String,
    pub details: Option<String>,
    pub priority: Option<Priority>,
}

impl NewCase {
    pub fn kind(&self) -> CaseKind {
        self.category.kind()
    }

    pub fn initial_status(&self) -> CaseStatus {
        CaseStatus::initial(self.kind())
    }
}

/// Row shape of `cases` joined with the owner's profile block
#[derive(Debug, Clone, FromRow)]
pub struct CaseRow {
    pub id: Uuid,
    pub kind: String,
    pub owner_id: Uuid,
    pub student_identifier: Option<String>,
    pub owner_block: Option<String>,
    pub category: String,
    pub title: Option<String>,
    pub description: String,
    pub details: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CaseRow> for Case {
    type Error = AppError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        let corrupt = |e: AppError| {
            tracing::error!("Corrupt case row {}: {}", row.id, e);
            AppError::Persistence(format!("Case {} has invalid stored values", row.id))
        };

        let kind: CaseKind = row.kind.parse().map_err(corrupt)?;
        let category = CaseCategory::parse(kind, &row.category).map_err(corrupt)?;
        let status = CaseStatus::parse(kind, &row.status).map_err(corrupt)?;
        let priority = row
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()
            .map_err(corrupt)?;

        Ok(Case {
            id: row.id,
            kind,
            owner_id: row.owner_id,
            student_identifier: row.student_identifier,
            owner_block: row.owner_block,
            category,
            title: row.title,
            description: row.description,
            details: row.details,
            status,
            priority,
            comment: row.comment,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_matches_kind() {
        assert_eq!(
            CaseCategory::parse(CaseKind::Complaint, "plumbing").unwrap(),
            CaseCategory::Complaint(ComplaintCategory::Plumbing)
        );
        assert_eq!(
            CaseCategory::parse(CaseKind::Complaint, "Lost and Found").unwrap(),
            CaseCategory::Complaint(ComplaintCategory::LostAndFound)
        );
        assert!(CaseCategory::parse(CaseKind::Apology, "plumbing").is_err());
        assert!(CaseCategory::parse(CaseKind::Complaint, "outing").is_err());
    }

    #[test]
    fn test_category_serializes_as_plain_string() {
        let category = CaseCategory::Apology(ApologyCategory::Misconduct);
        assert_eq!(serde_json::to_value(category).unwrap(), "misconduct");
    }

    #[test]
    fn test_row_with_foreign_status_is_rejected() {
        let row = CaseRow {
            id: Uuid::new_v4(),
            kind: "complaint".to_string(),
            owner_id: Uuid::new_v4(),
            student_identifier: None,
            owner_block: Some("A".to_string()),
            category: "plumbing".to_string(),
            title: Some("Leak".to_string()),
            description: "Tap leaking".to_string(),
            details: None,
            status: "accepted".to_string(),
            priority: Some("high".to_string()),
            comment: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(matches!(
            Case::try_from(row),
            Err(AppError::Persistence(_))
        ));
    }
}
