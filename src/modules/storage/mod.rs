//! Remote media storage for attachments
//!
//! The remote store is treated as unreliable: callers keep a local copy
//! until an upload has succeeded.

mod minio_client;

use async_trait::async_trait;
use std::path::Path;

use crate::core::error::Result;

pub use minio_client::MinIOClient;

/// Result of a successful remote upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    /// Identifier used to delete the object later
    pub public_id: String,
    pub size_bytes: i64,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload the file at `local_path` into `folder`, named after `id_hint`
    async fn upload(
        &self,
        local_path: &Path,
        folder: &str,
        id_hint: &str,
        content_type: &str,
    ) -> Result<UploadedMedia>;

    async fn delete(&self, public_id: &str) -> Result<()>;
}
