//! Accounts and student profiles.
//!
//! Accounts are provisioned elsewhere; the case engine looks them up for
//! scoping and recipient resolution, and exposes student profiles to the
//! student and to reviewers.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::ProfileService;
