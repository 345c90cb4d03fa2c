mod notification;

pub use notification::{NewNotification, Notification, NotificationCategory, NotificationRow};
