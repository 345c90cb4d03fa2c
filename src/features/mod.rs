pub mod accounts;
pub mod auth;
pub mod cases;
pub mod dashboard;
pub mod notifications;
