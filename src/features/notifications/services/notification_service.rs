use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::cases::models::Case;
use crate::features::notifications::models::Notification;
use crate::features::notifications::services::templates::{
    creation_notification, transition_notification,
};
use crate::features::notifications::services::RecipientResolver;
use crate::modules::store::CaseStore;

/// Creates case notifications and serves each recipient's inbox
pub struct NotificationService {
    store: Arc<dyn CaseStore>,
    resolver: RecipientResolver,
}

impl NotificationService {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self {
            resolver: RecipientResolver::new(store.clone()),
            store,
        }
    }

    /// One notification per resolved staff recipient, written in a single batch
    pub async fn notify_case_created(&self, case: &Case) -> Result<Vec<Notification>> {
        let recipients = self.resolver.resolve_for_case(case).await?;
        if recipients.is_empty() {
            tracing::warn!("No recipients for new {} {}", case.kind, case.id);
            return Ok(Vec::new());
        }

        let batch = recipients
            .into_iter()
            .map(|recipient| creation_notification(case, recipient))
            .collect();

        let created = self.store.insert_notifications(batch).await?;
        tracing::info!(
            "Notified {} staff members of new {} {}",
            created.len(),
            case.kind,
            case.id
        );
        Ok(created)
    }

    /// Notify the owner of `case` about its current status, if that status has a template
    pub async fn notify_transition(&self, case: &Case) -> Result<Option<Notification>> {
        let Some(notification) = transition_notification(case) else {
            return Ok(None);
        };

        self.store
            .insert_notification(notification)
            .await
            .map(Some)
            .map_err(|e| {
                tracing::error!(
                    "Failed to notify owner of {} {}: {:?}",
                    case.kind,
                    case.id,
                    e
                );
                AppError::NotificationDelivery(format!(
                    "The {} owner could not be notified",
                    case.kind
                ))
            })
    }

    /// Inbox of `recipient_id`, newest first, with the unread count
    pub async fn list(&self, recipient_id: Uuid) -> Result<(Vec<Notification>, i64)> {
        let notifications = self.store.list_notifications(recipient_id).await?;
        let unread = self.store.count_unread_notifications(recipient_id).await?;
        Ok((notifications, unread))
    }

    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> Result<Notification> {
        self.store
            .mark_notification_read(id, recipient_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    pub async fn mark_all_read(&self, recipient_id: Uuid) -> Result<u64> {
        self.store.mark_all_notifications_read(recipient_id).await
    }

    pub async fn delete(&self, id: Uuid, recipient_id: Uuid) -> Result<()> {
        if self.store.delete_notification(id, recipient_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Notification {} not found", id)))
        }
    }
}
