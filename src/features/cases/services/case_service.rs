use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::features::auth::policy::can_view_case;
use crate::features::cases::models::{
    Attachment, Case, CaseCategory, CaseKind, CaseStatus, NewCase, Priority, StoredAttachment,
    TimelineEntry,
};
use crate::features::cases::services::{
    AttachmentIngester, AttachmentUpload, TimelineRecorder, ValidatedAttachment,
};
use crate::features::notifications::models::Notification;
use crate::features::notifications::{DispatchJob, NotificationDispatcher, NotificationService};
use crate::modules::store::{CaseFilter, CaseStore};
use crate::shared::validation::normalize_block;

/// Fields of a new complaint or apology, already typed by the handler
#[derive(Debug, Clone)]
pub struct CaseSubmission {
    pub category: CaseCategory,
    pub title: Option<String>,
    pub description: String,
    pub details: Option<String>,
    pub priority: Option<Priority>,
    pub attachments: Vec<AttachmentUpload>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CaseSubmission {
    fn kind(&self) -> CaseKind {
        self.category.kind()
    }

    fn validate(&self) -> Result<()> {
        if self.description.trim().is_empty() {
            let field = match self.kind() {
                CaseKind::Complaint => "Description",
                CaseKind::Apology => "Message",
            };
            return Err(AppError::Validation(format!("{} is required", field)));
        }
        if self.kind() == CaseKind::Complaint
            && self.title.as_deref().map_or(true, |t| t.trim().is_empty())
        {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        Ok(())
    }
}

/// A case with its children, as returned to clients
#[derive(Debug, Clone)]
pub struct CaseDetail {
    pub case: Case,
    pub attachments: Vec<Attachment>,
    /// Only loaded for single-case reads
    pub timeline: Option<Vec<TimelineEntry>>,
}

/// Why the owner of a transitioned case was not notified.
///
/// Carries only the error kind and a caller-safe message; the underlying
/// store error is logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFailure {
    pub kind: &'static str,
    pub message: String,
}

impl From<AppError> for NotificationFailure {
    fn from(error: AppError) -> Self {
        let kind = error.kind();
        let message = match error {
            AppError::NotificationDelivery(message) => message,
            other => {
                tracing::error!("Unexpected notification failure: {:?}", other);
                "The case owner could not be notified".to_string()
            }
        };
        Self { kind, message }
    }
}

/// Result of a committed status change
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub detail: CaseDetail,
    pub timeline_entry: TimelineEntry,
    pub notification: Option<Notification>,
    /// The status change stands even when the owner could not be notified
    pub notification_error: Option<NotificationFailure>,
}

/// Lifecycle of complaints and apologies.
///
/// Every multi-row write runs in one store transaction. Notifications are
/// only produced after that transaction has committed.
pub struct CaseService {
    store: Arc<dyn CaseStore>,
    ingester: AttachmentIngester,
    notifications: Arc<NotificationService>,
    dispatcher: NotificationDispatcher,
}

impl CaseService {
    pub fn new(
        store: Arc<dyn CaseStore>,
        ingester: AttachmentIngester,
        notifications: Arc<NotificationService>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            ingester,
            notifications,
            dispatcher,
        }
    }

    fn not_found(id: Uuid) -> AppError {
        AppError::NotFound(format!("Case {} not found", id))
    }

    /// Normalized block of the acting account, if it has one
    async fn actor_block(&self, actor: &AuthenticatedUser) -> Result<Option<String>> {
        let account = self.store.find_account(actor.user_id).await?;
        Ok(normalize_block(account.as_ref().and_then(|a| a.block.as_deref())))
    }

    /// Load a case the actor may read; anything else is reported as not found
    async fn visible_case(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<Case> {
        let case = self
            .store
            .find_case(id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let actor_block = if actor.role.is_reviewer() {
            self.actor_block(actor).await?
        } else {
            None
        };

        if can_view_case(
            actor.role,
            actor.user_id,
            actor_block.as_deref(),
            case.owner_id,
            case.owner_block.as_deref(),
        ) {
            Ok(case)
        } else {
            Err(Self::not_found(id))
        }
    }

    /// Create a case and all of its attachments atomically.
    ///
    /// Staff notification is queued once the case is committed.
    pub async fn create_case(
        &self,
        owner_id: Uuid,
        submission: CaseSubmission,
    ) -> Result<CaseDetail> {
        submission.validate()?;
        let kind = submission.kind();
        let CaseSubmission {
            category,
            title,
            description,
            details,
            priority,
            attachments,
        } = submission;

        let uploads = self.ingester.validate(attachments)?;

        let profile = self.store.find_student_profile(owner_id).await?;
        if profile.is_none() {
            warn!("No student profile for {}; creating {} without one", owner_id, kind);
        }

        let new_case = NewCase {
            id: Uuid::new_v4(),
            owner_id,
            student_identifier: profile.map(|p| p.student_identifier),
            category,
            title: match kind {
                CaseKind::Complaint => non_empty(title),
                CaseKind::Apology => None,
            },
            description: description.trim().to_string(),
            details: non_empty(details),
            priority: match kind {
                CaseKind::Complaint => Some(priority.unwrap_or_default()),
                CaseKind::Apology => None,
            },
        };
        let case_id = new_case.id;

        let mut stored = Vec::new();
        match self.persist_case(new_case, uploads, &mut stored).await {
            Ok(detail) => {
                info!(
                    "Created {} {} with {} attachments for {}",
                    kind,
                    case_id,
                    detail.attachments.len(),
                    owner_id
                );
                self.dispatcher
                    .enqueue(DispatchJob::CaseCreated(detail.case.clone()));
                Ok(detail)
            }
            Err(e) => {
                warn!("Creating {} {} failed, discarding media: {}", kind, case_id, e);
                self.ingester.discard(kind, case_id, &stored).await;
                Err(e)
            }
        }
    }

    async fn persist_case(
        &self,
        new_case: NewCase,
        uploads: Vec<ValidatedAttachment>,
        stored: &mut Vec<StoredAttachment>,
    ) -> Result<CaseDetail> {
        let mut tx = self.store.begin().await?;
        let case = tx.insert_case(new_case).await?;

        let mut attachments = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let file = self.ingester.ingest(case.kind, case.id, upload).await?;
            let row = tx.insert_attachment(case.id, &file).await;
            stored.push(file);
            attachments.push(row?);
        }

        tx.commit().await?;

        Ok(CaseDetail {
            case,
            attachments,
            timeline: None,
        })
    }

    /// Move a case to `raw_status` and record the change on its timeline.
    ///
    /// Transitions of one case are serialized on its row lock. The owner
    /// notification is written after commit; its failure is reported in
    /// the outcome and never undoes the transition.
    pub async fn transition_status(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        raw_status: &str,
        comment: Option<&str>,
    ) -> Result<TransitionOutcome> {
        let actor_block = self.actor_block(actor).await?;

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_case(case_id)
            .await?
            .ok_or_else(|| Self::not_found(case_id))?;

        if !actor
            .role
            .can_review(actor_block.as_deref(), current.owner_block.as_deref())
        {
            warn!(
                "{} may not change status of {} {}",
                actor.timeline_label(),
                current.kind,
                case_id
            );
            return Err(AppError::Forbidden(format!(
                "You cannot review this {}",
                current.kind
            )));
        }

        let next = CaseStatus::parse(current.kind, raw_status)?;
        current.status.ensure_transition(next)?;

        let comment = comment.map(str::trim).filter(|c| !c.is_empty());
        let case = tx.update_case_status(case_id, next, comment).await?;
        let timeline_entry = TimelineRecorder::status_changed(tx.as_mut(), actor, &case).await?;
        let attachments = tx.list_attachments(case_id).await?;
        tx.commit().await?;

        info!(
            "{} {} moved from {} to {} by {}",
            case.kind,
            case.id,
            current.status,
            case.status,
            actor.timeline_label()
        );

        let (notification, notification_error) =
            match self.notifications.notify_transition(&case).await {
                Ok(notification) => (notification, None),
                Err(e) => {
                    warn!("Status of {} updated but owner not notified", case.id);
                    (None, Some(NotificationFailure::from(e)))
                }
            };

        Ok(TransitionOutcome {
            detail: CaseDetail {
                case,
                attachments,
                timeline: None,
            },
            timeline_entry,
            notification,
            notification_error,
        })
    }

    /// Delete a case with its attachments, timeline and notifications.
    ///
    /// Media cleanup happens after commit and never fails the request.
    pub async fn delete_case(&self, actor: &AuthenticatedUser, case_id: Uuid) -> Result<()> {
        let actor_block = self.actor_block(actor).await?;

        let mut tx = self.store.begin().await?;
        let case = tx
            .lock_case(case_id)
            .await?
            .ok_or_else(|| Self::not_found(case_id))?;

        if !actor
            .role
            .can_delete(actor_block.as_deref(), case.owner_block.as_deref())
        {
            warn!(
                "{} may not delete {} {}",
                actor.timeline_label(),
                case.kind,
                case_id
            );
            return Err(AppError::Forbidden(format!(
                "You cannot delete this {}",
                case.kind
            )));
        }

        let attachments = tx.delete_attachments(case_id).await?;
        let entries = tx.delete_timeline(case_id).await?;
        let notifications = tx.delete_case_notifications(case_id, case.kind).await?;
        if !tx.delete_case(case_id).await? {
            return Err(Self::not_found(case_id));
        }
        tx.commit().await?;

        info!(
            "Deleted {} {} ({} attachments, {} timeline entries, {} notifications) by {}",
            case.kind,
            case_id,
            attachments.len(),
            entries,
            notifications,
            actor.timeline_label()
        );

        self.ingester
            .remove_case_media(case.kind, case_id, &attachments)
            .await;
        Ok(())
    }

    /// Cases visible to `actor`, newest first, each with its attachments
    pub async fn list_cases(
        &self,
        actor: &AuthenticatedUser,
        kind: Option<CaseKind>,
        status: Option<&str>,
    ) -> Result<Vec<CaseDetail>> {
        let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(match kind {
                Some(kind) => CaseStatus::parse(kind, raw)?,
                None => CaseStatus::parse(CaseKind::Complaint, raw)
                    .or_else(|_| CaseStatus::parse(CaseKind::Apology, raw))
                    .map_err(|_| {
                        AppError::Validation(format!("Invalid status '{}'", raw))
                    })?,
            }),
        };

        let mut filter = CaseFilter {
            kind,
            status,
            ..CaseFilter::default()
        };

        match actor.role {
            Role::Student => filter.owner_id = Some(actor.user_id),
            Role::Admin => match self.actor_block(actor).await? {
                Some(block) => filter.owner_block = Some(block),
                None => {
                    warn!("Admin {} has no block; no cases are visible", actor.user_id);
                    return Ok(Vec::new());
                }
            },
            Role::ChiefAdmin => {}
            Role::Counselor => {
                return Err(AppError::Forbidden(
                    "Counselors cannot list cases".to_string(),
                ))
            }
        }

        let cases = self.store.list_cases(&filter).await?;
        let mut details = Vec::with_capacity(cases.len());
        for case in cases {
            let attachments = self.store.list_attachments(case.id).await?;
            details.push(CaseDetail {
                case,
                attachments,
                timeline: None,
            });
        }
        Ok(details)
    }

    /// One case with its attachments and timeline
    pub async fn get_case(&self, actor: &AuthenticatedUser, id: Uuid) -> Result<CaseDetail> {
        let case = self.visible_case(actor, id).await?;
        let attachments = self.store.list_attachments(id).await?;
        let timeline = self.store.list_timeline(id).await?;

        Ok(CaseDetail {
            case,
            attachments,
            timeline: Some(timeline),
        })
    }

    /// Add a free-text entry to a visible case's timeline
    pub async fn append_timeline(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
        message: &str,
    ) -> Result<TimelineEntry> {
        if message.trim().is_empty() {
            return Err(AppError::Validation("Message is required".to_string()));
        }

        let actor_block = if actor.role.is_reviewer() {
            self.actor_block(actor).await?
        } else {
            None
        };

        let mut tx = self.store.begin().await?;
        let case = tx
            .lock_case(case_id)
            .await?
            .ok_or_else(|| Self::not_found(case_id))?;

        if !can_view_case(
            actor.role,
            actor.user_id,
            actor_block.as_deref(),
            case.owner_id,
            case.owner_block.as_deref(),
        ) {
            return Err(Self::not_found(case_id));
        }

        let entry = TimelineRecorder::note(tx.as_mut(), actor, case_id, message).await?;
        tx.commit().await?;
        Ok(entry)
    }

    /// Timeline of a visible case, oldest first
    pub async fn list_timeline(
        &self,
        actor: &AuthenticatedUser,
        case_id: Uuid,
    ) -> Result<Vec<TimelineEntry>> {
        self.visible_case(actor, case_id).await?;
        self.store.list_timeline(case_id).await
    }
}
