//! MinIO/S3-compatible media store
//!
//! Uploads attachment files under the public prefix of a single bucket and
//! deletes them again by object key. Uses rust-s3 for the S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use std::path::Path;
use tracing::{debug, info, warn};

use super::{MediaStore, UploadedMedia};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    public_prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration, creating the bucket if needed
    pub async fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Path-style URLs: http://endpoint/bucket instead of http://bucket.endpoint
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            public_prefix: config.public_prefix,
        };

        client.ensure_bucket_exists().await;

        info!(
            "MinIO media store initialized for endpoint: {}, bucket: {}, public_prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.public_prefix
        );

        Ok(client)
    }

    /// Create the bucket; an existing bucket is not an error
    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    /// Object key for an attachment, e.g. `public/complaints/<case id>/<hint>`
    fn object_key(&self, folder: &str, id_hint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.public_prefix,
            folder.trim_matches('/'),
            id_hint
        )
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }
}

#[async_trait]
impl MediaStore for MinIOClient {
    async fn upload(
        &self,
        local_path: &Path,
        folder: &str,
        id_hint: &str,
        content_type: &str,
    ) -> Result<UploadedMedia> {
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            AppError::Internal(format!(
                "Failed to read '{}' for upload: {}",
                local_path.display(),
                e
            ))
        })?;

        let key = self.object_key(folder, id_hint);
        self.bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());

        Ok(UploadedMedia {
            url: self.public_url(&key),
            public_id: key,
            size_bytes: data.len() as i64,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        self.bucket.delete_object(public_id).await.map_err(|e| {
            AppError::Internal(format!("Failed to delete file '{}': {}", public_id, e))
        })?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            public_id,
            self.bucket.name()
        );
        Ok(())
    }
}
