use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CaseFilter, CaseStore, StoreTransaction};
use crate::core::error::{AppError, Result};
use crate::features::accounts::models::{Account, AccountRow, StudentProfile};
use crate::features::auth::model::Role;
use crate::features::cases::models::{
    Attachment, Case, CaseKind, CaseRow, CaseStatus, NewCase, StoredAttachment, TimelineEntry,
};
use crate::features::notifications::models::{NewNotification, Notification, NotificationRow};

/// Case columns joined with the owner's profile block (`cases c`, `student_profiles sp`)
const CASE_SELECT: &str = r#"
    SELECT
        c.id, c.kind, c.owner_id, c.student_identifier, sp.block::TEXT AS owner_block,
        c.category, c.title, c.description, c.details, c.status, c.priority, c.comment,
        c.created_at, c.updated_at
"#;

const ATTACHMENT_COLUMNS: &str =
    "id, case_id, file_name, url, public_id, content_type, size_bytes, local_path, created_at";

const NOTIFICATION_COLUMNS: &str = "id, recipient_id, title, message, category, related_id, \
     related_kind, is_read, created_at, updated_at";

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        AppError::Database(e)
    }
}

fn into_cases(rows: Vec<CaseRow>) -> Result<Vec<Case>> {
    rows.into_iter().map(Case::try_from).collect()
}

fn into_notifications(rows: Vec<NotificationRow>) -> Result<Vec<Notification>> {
    rows.into_iter().map(Notification::try_from).collect()
}

async fn insert_notification_in(
    tx: &mut Transaction<'static, Postgres>,
    notification: &NewNotification,
) -> Result<Notification> {
    let row = sqlx::query_as::<_, NotificationRow>(&format!(
        r#"
        INSERT INTO notifications (id, recipient_id, title, message, category, related_id, related_kind)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(notification.recipient_id)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.category.as_str())
    .bind(notification.related_id)
    .bind(notification.related_kind.map(|k| k.as_str()))
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error("insert notification"))?;

    row.try_into()
}

/// PostgreSQL-backed [`CaseStore`]
pub struct PgCaseStore {
    pool: PgPool,
}

impl PgCaseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseStore for PgCaseStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;
        Ok(Box::new(PgStoreTransaction { tx }))
    }

    async fn find_case(&self, id: Uuid) -> Result<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            {CASE_SELECT}
            FROM cases c
            LEFT JOIN student_profiles sp ON sp.user_id = c.owner_id
            WHERE c.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch case"))?;

        row.map(Case::try_from).transpose()
    }

    async fn list_cases(&self, filter: &CaseFilter) -> Result<Vec<Case>> {
        let rows = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            {CASE_SELECT}
            FROM cases c
            LEFT JOIN student_profiles sp ON sp.user_id = c.owner_id
            WHERE ($1::TEXT IS NULL OR c.kind = $1)
              AND ($2::TEXT IS NULL OR c.status = $2)
              AND ($3::UUID IS NULL OR c.owner_id = $3)
              AND ($4::TEXT IS NULL OR sp.block::TEXT = $4)
            ORDER BY c.created_at DESC
            "#
        ))
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.owner_id)
        .bind(filter.owner_block.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list cases"))?;

        into_cases(rows)
    }

    async fn list_attachments(&self, case_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM case_attachments WHERE case_id = $1 ORDER BY created_at ASC"
        ))
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list attachments"))
    }

    async fn list_timeline(&self, case_id: Uuid) -> Result<Vec<TimelineEntry>> {
        sqlx::query_as::<_, TimelineEntry>(
            r#"
            SELECT id, case_id, author, message, created_at
            FROM timeline_entries
            WHERE case_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list timeline entries"))
    }

    async fn count_cases_by_status(&self, kind: CaseKind) -> Result<Vec<(CaseStatus, i64)>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*)::BIGINT
            FROM cases
            WHERE kind = $1
            GROUP BY status
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("count cases by status"))?;

        rows.into_iter()
            .map(|(status, count)| Ok((CaseStatus::parse(kind, &status)?, count)))
            .collect()
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, name, email, role, block::TEXT AS block FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch account"))?;

        row.map(Account::try_from).transpose()
    }

    async fn find_student_profile(&self, user_id: Uuid) -> Result<Option<StudentProfile>> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            SELECT user_id, student_identifier, block::TEXT AS block, room_no
            FROM student_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch student profile"))
    }

    async fn find_student_profile_by_identifier(
        &self,
        student_identifier: &str,
    ) -> Result<Option<StudentProfile>> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            SELECT user_id, student_identifier, block::TEXT AS block, room_no
            FROM student_profiles
            WHERE student_identifier = $1
            "#,
        )
        .bind(student_identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch student profile by identifier"))
    }

    async fn list_accounts_by_role(
        &self,
        role: Role,
        block: Option<&str>,
    ) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, name, email, role, block::TEXT AS block
            FROM users
            WHERE role = $1
              AND ($2::TEXT IS NULL OR block::TEXT = $2)
            ORDER BY id
            "#,
        )
        .bind(role.as_str())
        .bind(block)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list accounts by role"))?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;
        let created = insert_notification_in(&mut tx, &notification).await?;
        tx.commit().await.map_err(db_error("commit notification"))?;
        Ok(created)
    }

    async fn insert_notifications(
        &self,
        notifications: Vec<NewNotification>,
    ) -> Result<Vec<Notification>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin transaction"))?;

        let mut created = Vec::with_capacity(notifications.len());
        for notification in &notifications {
            created.push(insert_notification_in(&mut tx, notification).await?);
        }

        tx.commit().await.map_err(db_error("commit notifications"))?;
        Ok(created)
    }

    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list notifications"))?;

        into_notifications(rows)
    }

    async fn count_unread_notifications(&self, recipient_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM notifications WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count unread notifications"))
    }

    async fn mark_notification_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> Result<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, updated_at = NOW()
            WHERE id = $1 AND recipient_id = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("mark notification read"))?;

        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE, updated_at = NOW()
            WHERE recipient_id = $1 AND is_read = FALSE
            "#,
        )
        .bind(recipient_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("mark all notifications read"))?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND recipient_id = $2")
            .bind(id)
            .bind(recipient_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete notification"))?;

        Ok(result.rows_affected() > 0)
    }
}

/// Open PostgreSQL transaction; rolled back by sqlx when dropped uncommitted
struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_case(&mut self, case: NewCase) -> Result<Case> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            WITH c AS (
                INSERT INTO cases (
                    id, kind, owner_id, student_identifier, category, title,
                    description, details, status, priority
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
            )
            {CASE_SELECT}
            FROM c
            LEFT JOIN student_profiles sp ON sp.user_id = c.owner_id
            "#
        ))
        .bind(case.id)
        .bind(case.kind().as_str())
        .bind(case.owner_id)
        .bind(&case.student_identifier)
        .bind(case.category.as_str())
        .bind(&case.title)
        .bind(&case.description)
        .bind(&case.details)
        .bind(case.initial_status().as_str())
        .bind(case.priority.map(|p| p.as_str()))
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("insert case"))?;

        row.try_into()
    }

    async fn insert_attachment(
        &mut self,
        case_id: Uuid,
        attachment: &StoredAttachment,
    ) -> Result<Attachment> {
        sqlx::query_as::<_, Attachment>(&format!(
            r#"
            INSERT INTO case_attachments
                (id, case_id, file_name, url, public_id, content_type, size_bytes, local_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ATTACHMENT_COLUMNS}
            "#
        ))
        .bind(attachment.id)
        .bind(case_id)
        .bind(&attachment.file_name)
        .bind(&attachment.url)
        .bind(&attachment.public_id)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(&attachment.local_path)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("insert attachment"))
    }

    async fn lock_case(&mut self, id: Uuid) -> Result<Option<Case>> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            {CASE_SELECT}
            FROM cases c
            LEFT JOIN student_profiles sp ON sp.user_id = c.owner_id
            WHERE c.id = $1
            FOR UPDATE OF c
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("lock case"))?;

        row.map(Case::try_from).transpose()
    }

    async fn list_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM case_attachments WHERE case_id = $1 ORDER BY created_at ASC"
        ))
        .bind(case_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("list attachments"))
    }

    async fn update_case_status(
        &mut self,
        id: Uuid,
        status: CaseStatus,
        comment: Option<&str>,
    ) -> Result<Case> {
        let row = sqlx::query_as::<_, CaseRow>(&format!(
            r#"
            WITH c AS (
                UPDATE cases
                SET status = $2, comment = COALESCE($3, comment), updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            {CASE_SELECT}
            FROM c
            LEFT JOIN student_profiles sp ON sp.user_id = c.owner_id
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .bind(comment)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("update case status"))?;

        row.ok_or_else(|| AppError::NotFound(format!("Case {} not found", id)))?
            .try_into()
    }

    async fn insert_timeline_entry(
        &mut self,
        case_id: Uuid,
        author: &str,
        message: &str,
    ) -> Result<TimelineEntry> {
        sqlx::query_as::<_, TimelineEntry>(
            r#"
            INSERT INTO timeline_entries (id, case_id, author, message, created_at)
            SELECT $1, $2, $3, $4, GREATEST(
                clock_timestamp(),
                COALESCE((SELECT MAX(created_at) FROM timeline_entries WHERE case_id = $2), clock_timestamp())
            )
            RETURNING id, case_id, author, message, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(case_id)
        .bind(author)
        .bind(message)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("insert timeline entry"))
    }

    async fn delete_attachments(&mut self, case_id: Uuid) -> Result<Vec<Attachment>> {
        sqlx::query_as::<_, Attachment>(&format!(
            "DELETE FROM case_attachments WHERE case_id = $1 RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(case_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(db_error("delete attachments"))
    }

    async fn delete_timeline(&mut self, case_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM timeline_entries WHERE case_id = $1")
            .bind(case_id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete timeline entries"))?;
        Ok(result.rows_affected())
    }

    async fn delete_case_notifications(&mut self, case_id: Uuid, kind: CaseKind) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE related_id = $1 AND related_kind = $2")
                .bind(case_id)
                .bind(kind.as_str())
                .execute(&mut *self.tx)
                .await
                .map_err(db_error("delete case notifications"))?;
        Ok(result.rows_affected())
    }

    async fn delete_case(&mut self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(db_error("delete case"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(db_error("commit transaction"))
    }
}
