use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::accounts::models::{Account, StudentProfile};

/// Account identity merged with its student profile
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentProfileResponseDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Block recorded on the account
    pub block: Option<String>,
    pub room_no: Option<String>,
    pub student_identifier: Option<String>,
}

impl StudentProfileResponseDto {
    pub fn new(account: Account, profile: Option<StudentProfile>) -> Self {
        let (room_no, student_identifier) = match profile {
            Some(p) => (p.room_no, Some(p.student_identifier)),
            None => (None, None),
        };

        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            block: account.block,
            room_no,
            student_identifier,
        }
    }
}
