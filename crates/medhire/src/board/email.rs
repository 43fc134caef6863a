use crate::board::applications::domain::ApplicationStatus;

/// Typed template payloads; rendering to a body is the mailer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Employer-facing: a candidate applied to one of their jobs.
    ApplicationReceived {
        job_title: String,
        candidate_name: String,
        candidate_email: String,
    },
    /// Seeker-facing confirmation that their submission landed.
    ApplicationSubmitted {
        job_title: String,
        organization_name: String,
    },
    /// Seeker-facing status progression notice.
    ApplicationStatusUpdate {
        job_title: String,
        organization_name: String,
        status: ApplicationStatus,
    },
}

impl EmailTemplate {
    pub fn subject(&self) -> String {
        match self {
            EmailTemplate::ApplicationReceived { job_title, .. } => {
                format!("New application for {job_title}")
            }
            EmailTemplate::ApplicationSubmitted { job_title, .. } => {
                format!("Application received: {job_title}")
            }
            EmailTemplate::ApplicationStatusUpdate {
                job_title, status, ..
            } => {
                format!("{job_title}: application moved to {}", status.label())
            }
        }
    }
}

/// One outbound message: recipient plus template parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub recipient_name: String,
    pub template: EmailTemplate,
}

/// Email dispatch failure; callers log and continue.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Fire-and-forget message dispatch. The lifecycle engine never blocks a
/// user-facing result on the outcome of a send.
pub trait EmailNotifier: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}
