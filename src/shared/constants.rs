/// Number of leading bytes inspected when sniffing an attachment's content type
pub const SNIFF_PREFIX_LEN: usize = 512;

/// Multipart field carrying case attachments
pub const ATTACHMENTS_FIELD: &str = "attachments";

/// Notification title for a newly submitted complaint
pub const NEW_COMPLAINT_TITLE: &str = "New Complaint Submitted";

/// Notification title for a newly submitted apology
pub const NEW_APOLOGY_TITLE: &str = "New Apology Submitted";
