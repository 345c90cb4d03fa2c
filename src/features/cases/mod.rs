//! Complaints and apologies: submission with attachments, review
//! transitions, the audit timeline, and deletion.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::CaseService;
