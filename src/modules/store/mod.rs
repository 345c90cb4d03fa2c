//! Relational store for cases, their children, and notifications.
//!
//! Multi-row writes go through a [`StoreTransaction`]: nothing it writes is
//! visible to other readers until [`StoreTransaction::commit`], and dropping
//! it uncommitted rolls everything back.

mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::accounts::models::{Account, StudentProfile};
use crate::features::auth::model::Role;
use crate::features::cases::models::{
    Attachment, Case, CaseKind, CaseStatus, NewCase, StoredAttachment, TimelineEntry,
};
use crate::features::notifications::models::{NewNotification, Notification};

pub use postgres::PgCaseStore;

/// Filter for listing cases; `None` fields do not constrain
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub kind: Option<CaseKind>,
    pub status: Option<CaseStatus>,
    pub owner_id: Option<Uuid>,
    /// Matches the owner's profile block
    pub owner_block: Option<String>,
}

#[async_trait]
pub trait CaseStore: Send + Sync {
    /// Open a transaction for multi-row writes
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>>;

    /// Newest first
    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>>;

    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>>;

    /// Oldest first
    async fn list_timeline(&self, case_id: Uuid) -> Result<Vec<TimelineEntry>>;

    /// Number of cases of `kind` per stored status
    async fn count_cases_by_status(&self, kind: CaseKind) -> Result<Vec<(CaseStatus, i64)>>;

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>>;

    async fn find_student_profile(&self, user_id: Uuid) -> Result<Option<StudentProfile>>;

    /// Look a profile up by its external student identifier
    async fn find_student_profile_by_identifier(
        &self,
        student_identifier: &str,
    ) -> Result<Option<StudentProfile>>;

    /// Accounts with `role`, restricted to `block` when given
    async fn list_accounts_by_role(&self, role: Role, block: Option<&str>)
        -> Result<Vec<Account>>;

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification>;

    /// Write a batch of notifications atomically
    async fn insert_notifications(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>>;

    /// Newest first
    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;

    async fn count_unread_notifications(&self, recipient_id: Uuid) -> Result<i64>;

    /// `None` when the notification does not exist or belongs to someone else
    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>>;

    /// Returns the number of notifications that changed
    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64>;

    /// `false` when nothing was deleted
    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait StoreTransaction: Send {
    async fn insert_case(&mut self, case: NewCase) -> Result<Case>;

    async fn insert_attachment(
        &mut self,
        case_id: Uuid,
        attachment: &StoredAttachment,
    ) -> Result<Attachment>;

    /// Read a case and hold its row lock until the transaction ends
    async fn lock_case(&mut self, id: Uuid) -> Result<Option<Case>>;

    /// Attachments of a case as seen by this transaction
    async fn list_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>>;

    /// Set the status, and the reviewer comment when one is given
    async fn update_case_status(
        &mut self,
        id: Uuid,
        status: CaseStatus,
        comment: Option<&str>,
    ) -> Result<Case>;

    /// Append an entry whose timestamp is never earlier than the case's latest entry
    async fn insert_timeline_entry(
        &mut self,
        case_id: Uuid,
        author: &str,
        message: &str,
    ) -> Result<TimelineEntry>;

    /// Returns the removed rows so their media can be cleaned up
    async fn delete_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>>;

    async fn delete_timeline(&mut self, case_id: Uuid) -> Result<u64>;

    async fn delete_case_notifications(&mut self, case_id: Uuid, kind: CaseKind) -> Result<u64>;

    async fn delete_case(&mut self, id: Uuid) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
