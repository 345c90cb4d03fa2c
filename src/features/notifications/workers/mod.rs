mod dispatcher;

pub use dispatcher::{DispatchJob, NotificationDispatcher};
