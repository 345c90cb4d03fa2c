//! Test doubles and fixtures shared by unit and HTTP tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response, Router};
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::core::config::{NotificationConfig, StorageConfig};
use crate::core::error::{AppError, Result};
use crate::features::accounts::models::{Account, StudentProfile};
use crate::features::auth::model::{AuthenticatedUser, Role};
use crate::features::cases::models::{
    Attachment, Case, CaseKind, CaseStatus, NewCase, StoredAttachment, TimelineEntry,
};
use crate::features::cases::services::{AttachmentIngester, CaseService};
use crate::features::notifications::models::{NewNotification, Notification};
use crate::features::notifications::{NotificationDispatcher, NotificationService};
use crate::modules::storage::{MediaStore, UploadedMedia};
use crate::modules::store::{CaseFilter, CaseStore, StoreTransaction};

/// Smallest payload that sniffs as JPEG
pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01]
}

pub fn png_bytes() -> Vec<u8> {
    vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D]
}

pub fn storage_config(upload_dir: &Path) -> StorageConfig {
    StorageConfig {
        upload_dir: upload_dir.to_path_buf(),
        public_path: "/uploads".to_string(),
        max_attachment_size: 1024 * 1024,
        max_attachments_per_case: 5,
        accepted_image_types: vec!["image/jpeg".to_string()],
    }
}

/// Case service over `store` with local-only attachment storage and a live dispatcher
pub fn case_service(store: &MemoryCaseStore, upload_dir: &Path) -> CaseService {
    let shared: Arc<dyn CaseStore> = Arc::new(store.clone());
    let notifications = Arc::new(NotificationService::new(shared.clone()));
    let dispatcher =
        NotificationDispatcher::spawn(&NotificationConfig::default(), notifications.clone());
    let ingester = AttachmentIngester::new(storage_config(upload_dir), None);
    CaseService::new(shared, ingester, notifications, dispatcher)
}

async fn inject_user(user: AuthenticatedUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Wrap a router so every request arrives authenticated as `user`
pub fn with_user(router: Router, user: AuthenticatedUser) -> Router {
    router.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
        inject_user(user.clone(), request, next)
    }))
}

pub fn as_user(account: &Account) -> AuthenticatedUser {
    AuthenticatedUser::new(account.id, account.role)
}

/// Wait up to two seconds for `recipient_id` to hold exactly `count` notifications
pub async fn wait_for_notifications(store: &MemoryCaseStore, recipient_id: Uuid, count: usize) -> bool {
    for _ in 0..200 {
        if store.snapshot().await.notifications_for(recipient_id).len() == count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Everything the in-memory store holds
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub accounts: Vec<Account>,
    pub profiles: HashMap<Uuid, StudentProfile>,
    pub cases: Vec<Case>,
    pub attachments: Vec<Attachment>,
    pub timeline: Vec<TimelineEntry>,
    pub notifications: Vec<Notification>,
    pub fail_notification_inserts: bool,
    pub fail_attachment_inserts: bool,
    /// Fails reads of attachments made outside a transaction
    pub fail_attachment_reads: bool,
}

impl MemoryState {
    fn with_owner_block(&self, mut case: Case) -> Case {
        case.owner_block = self.profiles.get(&case.owner_id).map(|p| p.block.clone());
        case
    }

    pub fn case(&self, id: Uuid) -> Option<Case> {
        self.cases
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .map(|c| self.with_owner_block(c))
    }

    pub fn timeline_for(&self, case_id: Uuid) -> Vec<TimelineEntry> {
        self.timeline
            .iter()
            .filter(|e| e.case_id == case_id)
            .cloned()
            .collect()
    }

    pub fn attachments_for(&self, case_id: Uuid) -> Vec<Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.case_id == case_id)
            .cloned()
            .collect()
    }

    pub fn notifications_for(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect()
    }

    fn notification(&self, new: NewNotification) -> Result<Notification> {
        if self.fail_notification_inserts {
            return Err(AppError::Persistence("notification insert failed".to_string()));
        }
        let now = Utc::now();
        Ok(Notification {
            id: Uuid::new_v4(),
            recipient_id: new.recipient_id,
            title: new.title,
            message: new.message,
            category: new.category,
            related_id: new.related_id,
            related_kind: new.related_kind,
            is_read: false,
            created_at: now,
            updated_at: now,
        })
    }
}

/// In-memory [`CaseStore`].
///
/// A transaction holds the state lock for its whole lifetime and works on a
/// copy that replaces the shared state only on commit.
#[derive(Clone, Default)]
pub struct MemoryCaseStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn add_account(&self, role: Role, block: Option<&str>) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: Name().fake(),
            email: SafeEmail().fake(),
            role,
            block: block.map(str::to_string),
        };
        self.state.lock().await.accounts.push(account.clone());
        account
    }

    pub async fn add_student(&self, block: &str) -> Account {
        let account = self.add_account(Role::Student, Some(block)).await;
        let profile = StudentProfile {
            user_id: account.id,
            student_identifier: format!("STU{}", (10000..99999).fake::<u32>()),
            block: block.to_string(),
            room_no: Some(format!("{}-{}", block, (100..400).fake::<u16>())),
        };
        self.state
            .lock()
            .await
            .profiles
            .insert(account.id, profile);
        account
    }

    pub async fn set_fail_notification_inserts(&self, fail: bool) {
        self.state.lock().await.fail_notification_inserts = fail;
    }

    pub async fn set_fail_attachment_inserts(&self, fail: bool) {
        self.state.lock().await.fail_attachment_inserts = fail;
    }

    pub async fn set_fail_attachment_reads(&self, fail: bool) {
        self.state.lock().await.fail_attachment_reads = fail;
    }
}

#[async_trait]
impl CaseStore for MemoryCaseStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>> {
        Ok(self.state.lock().await.case(id))
    }

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>> {
        let state = self.state.lock().await;
        let mut cases: Vec<Case> = state
            .cases
            .iter()
            .cloned()
            .map(|c| state.with_owner_block(c))
            .filter(|c| filter.kind.map_or(true, |k| c.kind == k))
            .filter(|c| filter.status.map_or(true, |s| c.status == s))
            .filter(|c| filter.owner_id.map_or(true, |o| c.owner_id == o))
            .filter(|c| {
                filter
                    .owner_block
                    .as_ref()
                    .map_or(true, |b| c.owner_block.as_ref() == Some(b))
            })
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cases)
    }

    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>> {
        let state = self.state.lock().await;
        if state.fail_attachment_reads {
            return Err(AppError::Persistence("attachment read failed".to_string()));
        }
        Ok(state.attachments_for(case_id))
    }

    async fn list_timeline(&self, case_id: Uuid) -> Result<Vec<TimelineEntry>> {
        Ok(self.state.lock().await.timeline_for(case_id))
    }

    async fn count_cases_by_status(&self, kind: CaseKind) -> Result<Vec<(CaseStatus, i64)>> {
        let state = self.state.lock().await;
        let mut counts: Vec<(CaseStatus, i64)> = Vec::new();
        for case in state.cases.iter().filter(|c| c.kind == kind) {
            match counts.iter_mut().find(|(s, _)| *s == case.status) {
                Some((_, n)) => *n += 1,
                None => counts.push((case.status, 1)),
            }
        }
        Ok(counts)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_student_profile(&self, user_id: Uuid) -> Result<Option<StudentProfile>> {
        Ok(self.state.lock().await.profiles.get(&user_id).cloned())
    }

    async fn find_student_profile_by_identifier(
        &self,
        student_identifier: &str,
    ) -> Result<Option<StudentProfile>> {
        let state = self.state.lock().await;
        Ok(state
            .profiles
            .values()
            .find(|p| p.student_identifier == student_identifier)
            .cloned())
    }

    async fn list_accounts_by_role(
        &self,
        role: Role,
        block: Option<&str>,
    ) -> Result<Vec<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .iter()
            .filter(|a| a.role == role)
            .filter(|a| block.map_or(true, |b| a.block.as_deref() == Some(b)))
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let mut state = self.state.lock().await;
        let created = state.notification(notification)?;
        state.notifications.push(created.clone());
        Ok(created)
    }

    async fn insert_notifications(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>> {
        let mut state = self.state.lock().await;
        let created = notifications
            .into_iter()
            .map(|n| state.notification(n))
            .collect::<Result<Vec<_>>>()?;
        state.notifications.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications = self.state.lock().await.notifications_for(recipient_id);
        notifications.reverse();
        Ok(notifications)
    }

    async fn count_unread_notifications(&self, recipient_id: Uuid) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as i64)
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>> {
        let mut state = self.state.lock().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .map(|n| {
                n.is_read = true;
                n.updated_at = Utc::now();
                n.clone()
            }))
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.recipient_id == recipient_id));
        Ok(state.notifications.len() < before)
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_case(&mut self, case: NewCase) -> Result<Case> {
        let now = Utc::now();
        let created = Case {
            id: case.id,
            kind: case.kind(),
            owner_id: case.owner_id,
            student_identifier: case.student_identifier.clone(),
            owner_block: None,
            category: case.category,
            title: case.title.clone(),
            description: case.description.clone(),
            details: case.details.clone(),
            status: case.initial_status(),
            priority: case.priority,
            comment: None,
            created_at: now,
            updated_at: now,
        };
        self.working.cases.push(created.clone());
        Ok(self.working.with_owner_block(created))
    }

    async fn insert_attachment(
        &mut self,
        case_id: Uuid,
        attachment: &StoredAttachment,
    ) -> Result<Attachment> {
        if self.working.fail_attachment_inserts {
            return Err(AppError::Persistence("attachment insert failed".to_string()));
        }
        let row = Attachment {
            id: attachment.id,
            case_id,
            file_name: attachment.file_name.clone(),
            url: attachment.url.clone(),
            public_id: attachment.public_id.clone(),
            content_type: attachment.content_type.clone(),
            size_bytes: attachment.size_bytes,
            local_path: attachment.local_path.clone(),
            created_at: Utc::now(),
        };
        self.working.attachments.push(row.clone());
        Ok(row)
    }

    async fn lock_case(&mut self, id: Uuid) -> Result<Option<Case>> {
        Ok(self.working.case(id))
    }

    async fn list_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>> {
        Ok(self.working.attachments_for(case_id))
    }

    async fn update_case_status(
        &mut self,
        id: Uuid,
        status: CaseStatus,
        comment: Option<&str>,
    ) -> Result<Case> {
        let case = self
            .working
            .cases
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Case {} not found", id)))?;
        case.status = status;
        if let Some(comment) = comment {
            case.comment = Some(comment.to_string());
        }
        case.updated_at = Utc::now();
        let updated = case.clone();
        Ok(self.working.with_owner_block(updated))
    }

    async fn insert_timeline_entry(
        &mut self,
        case_id: Uuid,
        author: &str,
        message: &str,
    ) -> Result<TimelineEntry> {
        let latest = self
            .working
            .timeline
            .iter()
            .filter(|e| e.case_id == case_id)
            .map(|e| e.created_at)
            .max();
        let now = Utc::now();
        let entry = TimelineEntry {
            id: Uuid::new_v4(),
            case_id,
            author: author.to_string(),
            message: message.to_string(),
            created_at: latest.map_or(now, |l| l.max(now)),
        };
        self.working.timeline.push(entry.clone());
        Ok(entry)
    }

    async fn delete_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>> {
        let (removed, kept): (Vec<Attachment>, Vec<Attachment>) = self
            .working
            .attachments
            .drain(..)
            .partition(|a| a.case_id == case_id);
        self.working.attachments = kept;
        Ok(removed)
    }

    async fn delete_timeline(&mut self, case_id: Uuid) -> Result<u64> {
        let before = self.working.timeline.len();
        self.working.timeline.retain(|e| e.case_id != case_id);
        Ok((before - self.working.timeline.len()) as u64)
    }

    async fn delete_case_notifications(&mut self, case_id: Uuid, kind: CaseKind) -> Result<u64> {
        let before = self.working.notifications.len();
        self.working
            .notifications
            .retain(|n| !(n.related_id == Some(case_id) && n.related_kind == Some(kind)));
        Ok((before - self.working.notifications.len()) as u64)
    }

    async fn delete_case(&mut self, id: Uuid) -> Result<bool> {
        let before = self.working.cases.len();
        self.working.cases.retain(|c| c.id != id);
        Ok(self.working.cases.len() < before)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}

/// [`MediaStore`] that records calls and can be told to fail
#[derive(Default)]
pub struct FakeMediaStore {
    fail: bool,
    uploaded: StdMutex<Vec<String>>,
    deleted: StdMutex<Vec<String>>,
}

impl FakeMediaStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(
        &self,
        local_path: &Path,
        folder: &str,
        id_hint: &str,
        _content_type: &str,
    ) -> Result<UploadedMedia> {
        if self.fail {
            return Err(AppError::Internal("media store unavailable".to_string()));
        }
        let size = std::fs::metadata(local_path)
            .map_err(|e| AppError::Internal(e.to_string()))?
            .len();
        let public_id = format!("{}/{}", folder, id_hint);
        self.uploaded.lock().unwrap().push(public_id.clone());
        Ok(UploadedMedia {
            url: format!("https://media.test/{}", public_id),
            public_id,
            size_bytes: size as i64,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        if self.fail {
            return Err(AppError::Internal("media store unavailable".to_string()));
        }
        Ok(())
    }
}
