use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::model::Role;

/// Account as provisioned by the identity provider
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Block label; required for block admins, informational for everyone else
    pub block: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub block: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(AppError::Persistence)?;
        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            block: row.block,
        })
    }
}

/// Student-specific data keyed by the student's account id
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct StudentProfile {
    pub user_id: Uuid,
    /// External identifier such as a university roll number
    pub student_identifier: String,
    pub block: String,
    pub room_no: Option<String>,
}
