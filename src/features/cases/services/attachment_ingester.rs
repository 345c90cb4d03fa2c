use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::{AppError, Result};
use crate::features::cases::models::{Attachment, CaseKind, StoredAttachment};
use crate::modules::storage::MediaStore;
use crate::shared::constants::SNIFF_PREFIX_LEN;

/// Raw attachment as received from the client
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Attachment whose size and sniffed type have been accepted
#[derive(Debug, Clone)]
pub struct ValidatedAttachment {
    file_name: String,
    content_type: &'static str,
    data: Vec<u8>,
}

/// Detect an image format from the leading bytes of a payload
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    let prefix = &data[..data.len().min(SNIFF_PREFIX_LEN)];

    // JPEG: FF D8 FF
    if prefix.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if prefix.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // GIF: GIF87a or GIF89a
    if prefix.starts_with(b"GIF87a") || prefix.starts_with(b"GIF89a") {
        return Some("image/gif");
    }

    // WebP: RIFF....WEBP
    if prefix.len() >= 12 && prefix.starts_with(b"RIFF") && &prefix[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

/// Reduce a client-supplied file name to a safe single path component
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "attachment".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Validates attachment content and places it in durable storage.
///
/// Bytes are always written to the local upload directory first. With a
/// remote media store configured the file is then uploaded and the local
/// copy removed; if the upload fails the local copy stays and is served
/// from the public upload path instead.
pub struct AttachmentIngester {
    config: StorageConfig,
    media_store: Option<Arc<dyn MediaStore>>,
}

impl AttachmentIngester {
    pub fn new(config: StorageConfig, media_store: Option<Arc<dyn MediaStore>>) -> Self {
        Self {
            config,
            media_store,
        }
    }

    /// Check count, size and sniffed type of every upload before anything is written
    pub fn validate(&self, uploads: Vec<AttachmentUpload>) -> Result<Vec<ValidatedAttachment>> {
        if uploads.len() > self.config.max_attachments_per_case {
            return Err(AppError::Validation(format!(
                "Too many attachments: {} given, at most {} allowed",
                uploads.len(),
                self.config.max_attachments_per_case
            )));
        }

        uploads
            .into_iter()
            .map(|upload| self.validate_one(upload))
            .collect()
    }

    fn validate_one(&self, upload: AttachmentUpload) -> Result<ValidatedAttachment> {
        if upload.data.len() > self.config.max_attachment_size {
            return Err(AppError::Validation(format!(
                "Attachment '{}' is too large. Maximum size is {} bytes",
                upload.file_name, self.config.max_attachment_size
            )));
        }

        let content_type = sniff_content_type(&upload.data)
            .filter(|ct| self.config.accepted_image_types.iter().any(|a| a == ct))
            .ok_or_else(|| {
                AppError::UnsupportedMedia(format!(
                    "Attachment '{}' is not an accepted image. Allowed types: {}",
                    upload.file_name,
                    self.config.accepted_image_types.join(", ")
                ))
            })?;

        Ok(ValidatedAttachment {
            file_name: upload.file_name,
            content_type,
            data: upload.data,
        })
    }

    fn case_dir(&self, kind: CaseKind, case_id: Uuid) -> PathBuf {
        self.config
            .upload_dir
            .join(kind.storage_namespace())
            .join(case_id.to_string())
    }

    /// Persist one validated attachment of `case_id`
    pub async fn ingest(
        &self,
        kind: CaseKind,
        case_id: Uuid,
        attachment: ValidatedAttachment,
    ) -> Result<StoredAttachment> {
        let id = Uuid::new_v4();
        let stored_name = format!("{}-{}", id, sanitize_file_name(&attachment.file_name));
        let dir = self.case_dir(kind, case_id);
        let local_path = dir.join(&stored_name);
        let size_bytes = attachment.data.len() as i64;

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("Failed to create upload directory {}: {:?}", dir.display(), e);
            AppError::Persistence(format!("Failed to store attachment '{}'", attachment.file_name))
        })?;
        tokio::fs::write(&local_path, &attachment.data)
            .await
            .map_err(|e| {
                tracing::error!("Failed to write {}: {:?}", local_path.display(), e);
                AppError::Persistence(format!(
                    "Failed to store attachment '{}'",
                    attachment.file_name
                ))
            })?;

        if let Some(media_store) = &self.media_store {
            let folder = format!("{}/{}", kind.storage_namespace(), case_id);
            match media_store
                .upload(&local_path, &folder, &id.to_string(), attachment.content_type)
                .await
            {
                Ok(uploaded) => {
                    if let Err(e) = tokio::fs::remove_file(&local_path).await {
                        warn!(
                            "Uploaded {} but could not remove local copy: {}",
                            local_path.display(),
                            e
                        );
                    }
                    debug!("Attachment {} uploaded as {}", id, uploaded.public_id);
                    return Ok(StoredAttachment {
                        id,
                        file_name: attachment.file_name,
                        url: uploaded.url,
                        public_id: Some(uploaded.public_id),
                        content_type: attachment.content_type.to_string(),
                        size_bytes: uploaded.size_bytes,
                        local_path: None,
                    });
                }
                Err(e) => {
                    warn!(
                        "Remote upload of attachment {} failed, keeping local copy: {}",
                        id, e
                    );
                }
            }
        }

        Ok(StoredAttachment {
            id,
            file_name: attachment.file_name,
            url: format!(
                "{}/{}/{}/{}",
                self.config.public_path,
                kind.storage_namespace(),
                case_id,
                stored_name
            ),
            public_id: None,
            content_type: attachment.content_type.to_string(),
            size_bytes,
            local_path: Some(local_path.to_string_lossy().into_owned()),
        })
    }

    /// Best-effort removal of ingested media whose rows were rolled back
    pub async fn discard(&self, kind: CaseKind, case_id: Uuid, stored: &[StoredAttachment]) {
        for attachment in stored {
            self.remove_remote(attachment.public_id.as_deref()).await;
        }
        self.remove_case_dir(kind, case_id).await;
    }

    /// Best-effort removal of a deleted case's media
    pub async fn remove_case_media(
        &self,
        kind: CaseKind,
        case_id: Uuid,
        attachments: &[Attachment],
    ) {
        for attachment in attachments {
            self.remove_remote(attachment.public_id.as_deref()).await;
        }
        self.remove_case_dir(kind, case_id).await;
    }

    async fn remove_remote(&self, public_id: Option<&str>) {
        let (Some(media_store), Some(public_id)) = (&self.media_store, public_id) else {
            return;
        };
        if let Err(e) = media_store.delete(public_id).await {
            warn!("Failed to delete remote media {}: {}", public_id, e);
        }
    }

    async fn remove_case_dir(&self, kind: CaseKind, case_id: Uuid) {
        let dir = self.case_dir(kind, case_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::shared::test_helpers::{jpeg_bytes, png_bytes, storage_config, FakeMediaStore};

    fn upload(name: &str, data: Vec<u8>) -> AttachmentUpload {
        AttachmentUpload {
            file_name: name.to_string(),
            data,
        }
    }

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(sniff_content_type(&jpeg_bytes()), Some("image/jpeg"));
        assert_eq!(sniff_content_type(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_content_type(b"GIF89a\x01\x00"), Some("image/gif"));
        assert_eq!(
            sniff_content_type(b"RIFF\x24\x00\x00\x00WEBPVP8 "),
            Some("image/webp")
        );
        assert_eq!(sniff_content_type(b"%PDF-1.7"), None);
        assert_eq!(sniff_content_type(&[]), None);
    }

    #[test]
    fn test_sniff_ignores_declared_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = AttachmentIngester::new(storage_config(dir.path()), None);

        let err = ingester
            .validate(vec![upload("photo.jpg", b"%PDF-1.7 not an image".to_vec())])
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMedia(_)));
    }

    #[test]
    fn test_png_rejected_unless_configured() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = AttachmentIngester::new(storage_config(dir.path()), None);
        assert!(matches!(
            ingester.validate(vec![upload("a.png", png_bytes())]),
            Err(AppError::UnsupportedMedia(_))
        ));

        let mut config = storage_config(dir.path());
        config.accepted_image_types.push("image/png".to_string());
        let ingester = AttachmentIngester::new(config, None);
        let validated = ingester
            .validate(vec![upload("a.png", png_bytes())])
            .unwrap();
        assert_eq!(validated[0].content_type, "image/png");
    }

    #[test]
    fn test_limits_are_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = storage_config(dir.path());
        config.max_attachments_per_case = 1;
        config.max_attachment_size = 8;
        let ingester = AttachmentIngester::new(config, None);

        assert!(matches!(
            ingester.validate(vec![upload("a.jpg", jpeg_bytes()), upload("b.jpg", jpeg_bytes())]),
            Err(AppError::Validation(_))
        ));

        let mut big = jpeg_bytes();
        big.resize(64, 0);
        assert!(matches!(
            ingester.validate(vec![upload("big.jpg", big)]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my pic.jpg"), "my_pic.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "attachment");
    }

    #[tokio::test]
    async fn test_local_only_ingest_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let ingester = AttachmentIngester::new(storage_config(dir.path()), None);
        let case_id = Uuid::new_v4();

        let validated = ingester
            .validate(vec![upload("leak.jpg", jpeg_bytes())])
            .unwrap();
        let stored = ingester
            .ingest(CaseKind::Complaint, case_id, validated.into_iter().next().unwrap())
            .await
            .unwrap();

        assert!(stored.public_id.is_none());
        assert!(stored
            .url
            .starts_with(&format!("/uploads/complaints/{}/", case_id)));
        let local = PathBuf::from(stored.local_path.unwrap());
        assert!(local.starts_with(dir.path()));
        assert_eq!(std::fs::read(local).unwrap(), jpeg_bytes());
        assert_eq!(stored.size_bytes, jpeg_bytes().len() as i64);
    }

    #[tokio::test]
    async fn test_remote_upload_removes_local_copy() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FakeMediaStore::default());
        let ingester = AttachmentIngester::new(storage_config(dir.path()), Some(media.clone()));
        let case_id = Uuid::new_v4();

        let validated = ingester
            .validate(vec![upload("leak.jpg", jpeg_bytes())])
            .unwrap();
        let stored = ingester
            .ingest(CaseKind::Apology, case_id, validated.into_iter().next().unwrap())
            .await
            .unwrap();

        assert!(stored.local_path.is_none());
        let public_id = stored.public_id.unwrap();
        assert!(public_id.starts_with(&format!("apologies/{}/", case_id)));
        assert_eq!(media.uploaded(), vec![public_id]);

        let case_dir = dir.path().join("apologies").join(case_id.to_string());
        assert_eq!(std::fs::read_dir(case_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FakeMediaStore::failing());
        let ingester = AttachmentIngester::new(storage_config(dir.path()), Some(media.clone()));
        let case_id = Uuid::new_v4();

        let validated = ingester
            .validate(vec![upload("leak.jpg", jpeg_bytes())])
            .unwrap();
        let stored = ingester
            .ingest(CaseKind::Complaint, case_id, validated.into_iter().next().unwrap())
            .await
            .unwrap();

        assert!(stored.public_id.is_none());
        assert!(stored.url.starts_with("/uploads/complaints/"));
        assert!(Path::new(stored.local_path.as_deref().unwrap()).exists());
    }

    #[tokio::test]
    async fn test_discard_removes_local_and_remote_media() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(FakeMediaStore::default());
        let ingester = AttachmentIngester::new(storage_config(dir.path()), Some(media.clone()));
        let case_id = Uuid::new_v4();

        let validated = ingester
            .validate(vec![upload("a.jpg", jpeg_bytes())])
            .unwrap();
        let stored = ingester
            .ingest(CaseKind::Complaint, case_id, validated.into_iter().next().unwrap())
            .await
            .unwrap();

        ingester
            .discard(CaseKind::Complaint, case_id, std::slice::from_ref(&stored))
            .await;

        assert_eq!(media.deleted(), vec![stored.public_id.unwrap()]);
        assert!(!dir.path().join("complaints").join(case_id.to_string()).exists());
    }
}
