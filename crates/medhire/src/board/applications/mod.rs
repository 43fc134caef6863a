//! The application lifecycle engine: one seeker's relationship to one job,
//! from submission through reapplication, status progression, and
//! withdrawal, plus the counter and notification side effects that track
//! each transition.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AnswerEntry, Application, ApplicationStatus, CoverLetter, CoverLetterFile, HistoryEntry,
    LifecycleViolation, ResumeAttachment, SubmissionIntake, MAX_APPLY_ATTEMPTS,
};
pub use repository::ApplicationRepository;
pub use router::application_router;
pub use service::{
    ApplicationService, ApplicationServiceError, ErrorKind, SubmissionReceipt,
    FINAL_ATTEMPT_WARNING,
};
