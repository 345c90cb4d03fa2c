//! Case notifications: recipient resolution, background dispatch and the
//! per-user inbox.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod workers;

pub use routes::routes;
pub use services::NotificationService;
pub use workers::{DispatchJob, NotificationDispatcher};
