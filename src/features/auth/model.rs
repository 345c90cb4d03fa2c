use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Account role as carried in access tokens and stored on `users.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    /// Block-scoped reviewer
    Admin,
    /// Facility-wide reviewer
    ChiefAdmin,
    Counselor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
            Role::ChiefAdmin => "chief_admin",
            Role::Counselor => "counselor",
        }
    }

    /// Reviewers handle cases: block admins and chief admins
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Admin | Role::ChiefAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            "chief_admin" => Ok(Role::ChiefAdmin),
            "counselor" => Ok(Role::Counselor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Caller identity as established by the auth middleware
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Author label used on timeline entries, e.g. `admin:<uuid>`
    pub fn timeline_label(&self) -> String {
        format!("{}:{}", self.role, self.user_id)
    }
}

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub user_id: Uuid,
    pub role: Role,
    pub exp: u64,
}
