mod notification_service;
mod recipient_resolver;
pub mod templates;

pub use notification_service::NotificationService;
pub use recipient_resolver::RecipientResolver;
