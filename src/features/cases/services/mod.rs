mod attachment_ingester;
mod case_service;
mod timeline_recorder;

pub use attachment_ingester::{AttachmentIngester, AttachmentUpload, ValidatedAttachment};
pub use case_service::{
    CaseDetail, CaseService, CaseSubmission, NotificationFailure, TransitionOutcome,
};
pub use timeline_recorder::TimelineRecorder;
