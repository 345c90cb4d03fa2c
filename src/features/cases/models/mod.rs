mod attachment;
mod case;
mod status;
mod timeline;

pub use attachment::{Attachment, StoredAttachment};
pub use case::{
    ApologyCategory, Case, CaseCategory, CaseKind, CaseRow, ComplaintCategory, NewCase, Priority,
};
pub use status::{ApologyStatus, CaseStatus, ComplaintStatus};
pub use timeline::{status_changed_message, TimelineEntry};
