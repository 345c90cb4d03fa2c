use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::Role;
use crate::features::cases::models::Case;
use crate::modules::store::CaseStore;
use crate::shared::validation::normalize_block;

/// Decides which staff accounts hear about a case event.
///
/// The recipients are the block admins of the owner's block plus every
/// chief admin, each at most once. An owner without a resolvable block
/// reaches chief admins only.
pub struct RecipientResolver {
    store: Arc<dyn CaseStore>,
}

impl RecipientResolver {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_for_case(&self, case: &Case) -> Result<BTreeSet<Uuid>> {
        let profile = self.store.find_student_profile(case.owner_id).await?;
        let owner_block = normalize_block(profile.as_ref().map(|p| p.block.as_str()));

        let mut recipients = BTreeSet::new();

        if let Some(block) = owner_block.as_deref() {
            let admins = self
                .store
                .list_accounts_by_role(Role::Admin, Some(block))
                .await?;
            recipients.extend(admins.into_iter().map(|a| a.id));
        } else {
            tracing::warn!(
                "Case {} owner {} has no block; notifying chief admins only",
                case.id,
                case.owner_id
            );
        }

        let chiefs = self
            .store
            .list_accounts_by_role(Role::ChiefAdmin, None)
            .await?;
        recipients.extend(chiefs.into_iter().map(|a| a.id));

        Ok(recipients)
    }
}
