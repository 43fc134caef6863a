use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::identity::{ApplicationId, EmployerId, JobId, SeekerId, UserId};
use crate::board::storage::StoredObject;

/// Lifetime cap on submission cycles for one (job, seeker) pair.
pub const MAX_APPLY_ATTEMPTS: u8 = 2;

/// Status of an application. `Applied` is the only entry state; `Rejected`
/// and `Withdrawn` are terminal for the current attempt, with `Withdrawn`
/// permitting exactly one reapplication via [`Application::reapply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    #[serde(rename = "Under Review")]
    UnderReview,
    Interview,
    Offered,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Applied" => Some(ApplicationStatus::Applied),
            "Under Review" => Some(ApplicationStatus::UnderReview),
            "Interview" => Some(ApplicationStatus::Interview),
            "Offered" => Some(ApplicationStatus::Offered),
            "Rejected" => Some(ApplicationStatus::Rejected),
            "Withdrawn" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }

    /// Terminal for the current attempt: no withdrawal is possible from here.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

/// Resume snapshot embedded at submission time; later edits to the seeker's
/// profile resume do not rewrite past applications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAttachment {
    pub url: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    pub uploaded_at: DateTime<Utc>,
}

impl ResumeAttachment {
    pub fn from_upload(stored: StoredObject, filename: String, at: DateTime<Utc>) -> Self {
        Self {
            url: stored.url,
            filename,
            public_id: Some(stored.public_id),
            bytes: Some(stored.bytes),
            uploaded_at: at,
        }
    }
}

/// Uploaded cover-letter file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterFile {
    pub url: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
}

/// Cover letter: free text, an uploaded file, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLetter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<CoverLetterFile>,
}

impl CoverLetter {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.file.is_none()
    }
}

/// One answered screening question, kept in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub question: String,
    pub answer: String,
}

/// Append-only audit entry; one per state transition, never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub by: UserId,
    pub at: DateTime<Utc>,
}

/// Candidate-supplied material for one submission cycle.
#[derive(Debug, Clone, Default)]
pub struct SubmissionIntake {
    pub resume: Option<ResumeAttachment>,
    pub cover_letter: CoverLetter,
    pub answers: Vec<AnswerEntry>,
}

/// Why a lifecycle mutation was refused. All variants map to Conflict at
/// the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleViolation {
    #[error("you have already applied to this job")]
    DuplicateSubmission,
    #[error("maximum application attempts reached for this job")]
    AttemptsExhausted,
    #[error("application is already {}", .status.label())]
    AlreadyClosed { status: ApplicationStatus },
}

/// One seeker's relationship to one job. At most one document exists per
/// (job, seeker) pair for the pair's entire lifetime; reapplication mutates
/// this document in place and the document is never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub job: JobId,
    pub job_seeker: SeekerId,
    pub employer: EmployerId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_manual: Option<DateTime<Utc>>,
    pub apply_attempts: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeAttachment>,
    #[serde(default, skip_serializing_if = "CoverLetter::is_empty")]
    pub cover_letter: CoverLetter,
    #[serde(default)]
    pub answers: Vec<AnswerEntry>,
    pub history: Vec<HistoryEntry>,
    pub is_viewed_by_employer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

impl Application {
    /// First submission for a (job, seeker) pair.
    pub fn first_submission(
        id: ApplicationId,
        job: JobId,
        job_seeker: SeekerId,
        employer: EmployerId,
        intake: SubmissionIntake,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            job,
            job_seeker,
            employer,
            status: ApplicationStatus::Applied,
            applied_at: at,
            updated_at_manual: None,
            apply_attempts: 1,
            resume: intake.resume,
            cover_letter: intake.cover_letter,
            answers: intake.answers,
            history: vec![HistoryEntry {
                status: ApplicationStatus::Applied,
                note: Some("Application submitted".to_string()),
                by,
                at,
            }],
            is_viewed_by_employer: false,
            rating: None,
        }
    }

    /// Guard for a repeat submission against this document. `Ok` means the
    /// withdrawal-consumed reapply path is open.
    pub fn reapply_allowed(&self) -> Result<(), LifecycleViolation> {
        if self.status != ApplicationStatus::Withdrawn {
            return Err(LifecycleViolation::DuplicateSubmission);
        }
        if self.apply_attempts >= MAX_APPLY_ATTEMPTS {
            return Err(LifecycleViolation::AttemptsExhausted);
        }
        Ok(())
    }

    /// Consume the single permitted reapplication: reset to `Applied`,
    /// replace answers, merge new attachments over the existing snapshot.
    pub fn reapply(
        &mut self,
        intake: SubmissionIntake,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleViolation> {
        self.reapply_allowed()?;

        self.apply_attempts += 1;
        self.status = ApplicationStatus::Applied;
        self.applied_at = at;
        self.answers = intake.answers;
        if intake.resume.is_some() {
            self.resume = intake.resume;
        }
        if intake.cover_letter.text.is_some() {
            self.cover_letter.text = intake.cover_letter.text;
        }
        if intake.cover_letter.file.is_some() {
            self.cover_letter.file = intake.cover_letter.file;
        }
        self.push_history(
            ApplicationStatus::Applied,
            Some(format!(
                "Reapplied, attempt {} of {}",
                self.apply_attempts, MAX_APPLY_ATTEMPTS
            )),
            by,
            at,
        );

        Ok(())
    }

    /// Candidate-initiated withdrawal. Returns the status being left so the
    /// caller can settle the hire counter when leaving `Offered`.
    pub fn withdraw(
        &mut self,
        note: Option<String>,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<ApplicationStatus, LifecycleViolation> {
        if self.status.is_terminal() {
            return Err(LifecycleViolation::AlreadyClosed {
                status: self.status,
            });
        }

        let prior = self.status;
        self.status = ApplicationStatus::Withdrawn;
        self.updated_at_manual = Some(at);
        self.push_history(
            ApplicationStatus::Withdrawn,
            Some(note.unwrap_or_else(|| "Withdrawn by candidate".to_string())),
            by,
            at,
        );

        Ok(prior)
    }

    /// Employer/admin status progression. Returns the status being left.
    pub fn transition(
        &mut self,
        status: ApplicationStatus,
        note: Option<String>,
        by: UserId,
        at: DateTime<Utc>,
    ) -> ApplicationStatus {
        let prior = self.status;
        self.status = status;
        self.updated_at_manual = Some(at);
        self.push_history(status, note, by, at);
        prior
    }

    /// Flip the employer-viewed flag; true when this call changed it.
    pub fn record_view_by_employer(&mut self) -> bool {
        if self.is_viewed_by_employer {
            return false;
        }
        self.is_viewed_by_employer = true;
        true
    }

    fn push_history(
        &mut self,
        status: ApplicationStatus,
        note: Option<String>,
        by: UserId,
        at: DateTime<Utc>,
    ) {
        self.history.push(HistoryEntry {
            status,
            note,
            by,
            at,
        });
    }
}
