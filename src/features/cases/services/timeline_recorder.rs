use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::cases::models::{status_changed_message, Case, TimelineEntry};
use crate::modules::store::StoreTransaction;

/// Appends audit entries inside the caller's transaction.
///
/// The caller must already hold the case row lock, so entries of one case
/// are written in the order the transitions commit.
pub struct TimelineRecorder;

impl TimelineRecorder {
    /// Record that `case` now has its current status
    pub async fn status_changed(
        tx: &mut dyn StoreTransaction,
        actor: &AuthenticatedUser,
        case: &Case,
    ) -> Result<TimelineEntry> {
        let message = status_changed_message(case.status.as_str());
        tx.insert_timeline_entry(case.id, &actor.timeline_label(), &message)
            .await
    }

    /// Record a free-text note from `actor`
    pub async fn note(
        tx: &mut dyn StoreTransaction,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        message: &str,
    ) -> Result<TimelineEntry> {
        tx.insert_timeline_entry(case_id, &actor.timeline_label(), message.trim())
            .await
    }
}
