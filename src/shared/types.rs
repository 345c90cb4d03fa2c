use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response envelope shared by every handler.
///
/// Success: `{ success: true, message?, data?, meta? }`
/// Error: `{ success: false, error, message, details? }`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    /// Machine-readable error kind (e.g. `validation_error`, `forbidden`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<i64>,
}

impl Meta {
    pub fn total(total: usize) -> Self {
        Self {
            total: total as i64,
            unread: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            message,
            data,
            meta,
            error: None,
            details: None,
        }
    }

    pub fn error(kind: &str, message: String, details: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            message: Some(message),
            data: None,
            meta: None,
            error: Some(kind.to_string()),
            details,
        }
    }
}
