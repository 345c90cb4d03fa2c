//! Organizational scoping rules.
//!
//! Block admins act only on cases whose owner lives in their block; chief
//! admins act facility-wide. Blocks are compared after normalization, so an
//! empty or malformed block never matches anything.

use uuid::Uuid;

use crate::features::auth::model::Role;
use crate::shared::validation::normalize_block;

fn same_block(actor_block: Option<&str>, owner_block: Option<&str>) -> bool {
    match (normalize_block(actor_block), normalize_block(owner_block)) {
        (Some(actor), Some(owner)) => actor == owner,
        _ => false,
    }
}

impl Role {
    /// Whether this role may delete a case owned by a student of `owner_block`
    pub fn can_delete(self, actor_block: Option<&str>, owner_block: Option<&str>) -> bool {
        match self {
            Role::ChiefAdmin => true,
            Role::Admin => same_block(actor_block, owner_block),
            Role::Student | Role::Counselor => false,
        }
    }

    /// Whether this role may change the status of a case owned by a student of `owner_block`
    pub fn can_review(self, actor_block: Option<&str>, owner_block: Option<&str>) -> bool {
        match self {
            Role::ChiefAdmin => true,
            Role::Admin => same_block(actor_block, owner_block),
            Role::Student | Role::Counselor => false,
        }
    }
}

/// Read access to a single case and its timeline
pub fn can_view_case(
    role: Role,
    actor_id: Uuid,
    actor_block: Option<&str>,
    owner_id: Uuid,
    owner_block: Option<&str>,
) -> bool {
    match role {
        Role::Student => actor_id == owner_id,
        Role::Admin | Role::ChiefAdmin => role.can_review(actor_block, owner_block),
        Role::Counselor => false,
    }
}
