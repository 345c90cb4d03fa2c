use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    /// Remote media store; `None` keeps every attachment on local disk
    pub minio: Option<MinIOConfig>,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Shared HS256 secret used to verify access tokens
    pub jwt_secret: String,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Local attachment storage and upload limits
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory where attachment bytes are written before (or instead of) remote upload
    pub upload_dir: PathBuf,
    /// URL path under which `upload_dir` is served
    pub public_path: String,
    pub max_attachment_size: usize,
    pub max_attachments_per_case: usize,
    /// Sniffed MIME types accepted for attachments
    pub accepted_image_types: Vec<String>,
}

/// MinIO/S3 storage configuration for attachment uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for publicly accessible files (defaults to endpoint)
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Prefix under which attachments are stored (e.g., "public")
    pub public_prefix: String,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub queue_capacity: usize,
    pub workers: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            notifications: NotificationConfig::from_env()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 60 * 1024 * 1024; // 60MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins =
            split_list(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let max_request_body_size =
            parse_var("MAX_REQUEST_BODY_SIZE", Self::DEFAULT_MAX_REQUEST_BODY_SIZE)?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "JWT_SECRET environment variable is required".to_string())?;

        let jwt_leeway_secs = parse_var("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            jwt_secret,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Hostel Cases API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Complaints, apologies and notifications".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    const DEFAULT_MAX_ATTACHMENT_SIZE: usize = 10 * 1024 * 1024; // 10MB
    const DEFAULT_MAX_ATTACHMENTS_PER_CASE: usize = 5;
    const DEFAULT_ACCEPTED_IMAGE_TYPES: &'static str = "image/jpeg";

    pub fn from_env() -> Result<Self, String> {
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
        let public_path = env::var("UPLOAD_PUBLIC_PATH").unwrap_or_else(|_| "/uploads".to_string());

        let accepted_image_types = split_list(
            &env::var("ACCEPTED_IMAGE_TYPES")
                .unwrap_or_else(|_| Self::DEFAULT_ACCEPTED_IMAGE_TYPES.to_string()),
        );
        if accepted_image_types.is_empty() {
            return Err("ACCEPTED_IMAGE_TYPES must list at least one type".to_string());
        }

        Ok(Self {
            upload_dir: PathBuf::from(upload_dir),
            public_path: public_path.trim_end_matches('/').to_string(),
            max_attachment_size: parse_var(
                "MAX_ATTACHMENT_SIZE",
                Self::DEFAULT_MAX_ATTACHMENT_SIZE,
            )?,
            max_attachments_per_case: parse_var(
                "MAX_ATTACHMENTS_PER_CASE",
                Self::DEFAULT_MAX_ATTACHMENTS_PER_CASE,
            )?,
            accepted_image_types,
        })
    }
}

impl MinIOConfig {
    /// Returns `None` when `MINIO_ENDPOINT` is not set
    pub fn from_env() -> Result<Option<Self>, String> {
        let Some(endpoint) = env::var("MINIO_ENDPOINT").ok().filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "hostel-cases".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let public_prefix =
            env::var("MINIO_PUBLIC_PREFIX").unwrap_or_else(|_| "public".to_string());

        Ok(Some(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            public_prefix,
        }))
    }
}

impl NotificationConfig {
    const DEFAULT_QUEUE_CAPACITY: usize = 256;
    const DEFAULT_WORKERS: usize = 4;

    pub fn from_env() -> Result<Self, String> {
        let queue_capacity =
            parse_var("NOTIFICATION_QUEUE_CAPACITY", Self::DEFAULT_QUEUE_CAPACITY)?;
        let workers = parse_var("NOTIFICATION_WORKERS", Self::DEFAULT_WORKERS)?;

        if queue_capacity == 0 || workers == 0 {
            return Err(
                "NOTIFICATION_QUEUE_CAPACITY and NOTIFICATION_WORKERS must be positive".to_string(),
            );
        }

        Ok(Self {
            queue_capacity,
            workers,
        })
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::DEFAULT_QUEUE_CAPACITY,
            workers: Self::DEFAULT_WORKERS,
        }
    }
}
