use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::board::email::{EmailMessage, EmailNotifier, EmailTemplate};
use crate::board::employers::{EmployerProfile, EmployerRepository, EmployerStatAggregator};
use crate::board::identity::{Actor, ApplicationId, JobId, Role};
use crate::board::jobs::{Job, JobRepository};
use crate::board::notifications::{
    DedupeKey, NotificationDraft, NotificationEmitter, NotificationKind,
};
use crate::board::response::FieldError;
use crate::board::seekers::{SeekerProfile, SeekerRepository};
use crate::board::RepositoryError;

use super::domain::{
    Application, ApplicationStatus, LifecycleViolation, SubmissionIntake, MAX_APPLY_ATTEMPTS,
};
use super::repository::ApplicationRepository;

/// Returned alongside the record when the final attempt is being spent.
pub const FINAL_ATTEMPT_WARNING: &str =
    "This is your final attempt: withdrawing this application again will permanently close this job to you.";

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

/// Broad failure class used to pick an HTTP status for a service error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    Validation,
    Internal,
}

/// Error raised by the lifecycle engine. Detected before any mutation;
/// side-effect failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("job not open for applications")]
    JobNotOpen,
    #[error("job seeker profile not found")]
    SeekerProfileMissing,
    #[error("employer not found for job")]
    EmployerMissing,
    #[error("application not found")]
    NotFound,
    #[error("not authorized to access this application")]
    Forbidden,
    #[error(transparent)]
    Lifecycle(#[from] LifecycleViolation),
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ApplicationServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationServiceError::JobNotOpen | ApplicationServiceError::NotFound => {
                ErrorKind::NotFound
            }
            ApplicationServiceError::SeekerProfileMissing
            | ApplicationServiceError::EmployerMissing
            | ApplicationServiceError::Forbidden => ErrorKind::Forbidden,
            ApplicationServiceError::Lifecycle(_) => ErrorKind::Conflict,
            ApplicationServiceError::Validation(_) => ErrorKind::Validation,
            ApplicationServiceError::Repository(err) => match err {
                RepositoryError::Conflict => ErrorKind::Conflict,
                RepositoryError::NotFound => ErrorKind::NotFound,
                RepositoryError::Unavailable(_) => ErrorKind::Internal,
            },
        }
    }
}

/// Result of a submission: the document, which attempt this was, and the
/// foreclosure warning (null unless the final attempt was just spent).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub application: Application,
    pub attempt: u8,
    pub warning: Option<String>,
}

/// The application lifecycle engine: submission, reapplication, status
/// progression, withdrawal, and the counter/notification/email side effects
/// that accompany each transition.
///
/// Storage reads and writes are sequenced per call; counter updates and all
/// outbound notifications/emails are best-effort and logged on failure.
pub struct ApplicationService {
    applications: Arc<dyn ApplicationRepository>,
    jobs: Arc<dyn JobRepository>,
    seekers: Arc<dyn SeekerRepository>,
    employers: Arc<dyn EmployerRepository>,
    stats: EmployerStatAggregator,
    notifier: NotificationEmitter,
    mailer: Arc<dyn EmailNotifier>,
}

impl ApplicationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        applications: Arc<dyn ApplicationRepository>,
        jobs: Arc<dyn JobRepository>,
        seekers: Arc<dyn SeekerRepository>,
        employers: Arc<dyn EmployerRepository>,
        stats: EmployerStatAggregator,
        notifier: NotificationEmitter,
        mailer: Arc<dyn EmailNotifier>,
    ) -> Self {
        Self {
            applications,
            jobs,
            seekers,
            employers,
            stats,
            notifier,
            mailer,
        }
    }

    /// Submit an application to an open job, either creating the document or
    /// consuming the single permitted reapplication after a withdrawal.
    pub fn submit(
        &self,
        actor: &Actor,
        job_id: &JobId,
        intake: SubmissionIntake,
    ) -> Result<SubmissionReceipt, ApplicationServiceError> {
        let job = self
            .jobs
            .fetch(job_id)?
            .filter(Job::is_open)
            .ok_or(ApplicationServiceError::JobNotOpen)?;
        let seeker = self
            .seekers
            .find_by_user(&actor.user)?
            .ok_or(ApplicationServiceError::SeekerProfileMissing)?;
        let employer = self
            .employers
            .fetch(&job.employer)?
            .ok_or(ApplicationServiceError::EmployerMissing)?;

        let now = Utc::now();
        let application = match self
            .applications
            .find_by_job_and_seeker(job_id, &seeker.id)?
        {
            None => {
                let application = Application::first_submission(
                    next_application_id(),
                    job.id.clone(),
                    seeker.id.clone(),
                    employer.id.clone(),
                    intake,
                    actor.user.clone(),
                    now,
                );
                self.applications.insert(application)?
            }
            Some(mut existing) => {
                existing.reapply(intake, actor.user.clone(), now)?;
                self.applications.update(existing.clone())?;
                existing
            }
        };

        self.settle_submission_side_effects(&job, &seeker, &employer, &application);

        let attempt = application.apply_attempts;
        let warning =
            (attempt >= MAX_APPLY_ATTEMPTS).then(|| FINAL_ATTEMPT_WARNING.to_string());

        Ok(SubmissionReceipt {
            application,
            attempt,
            warning,
        })
    }

    /// Candidate withdrawal of a non-terminal application.
    pub fn withdraw(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        note: Option<String>,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationServiceError::NotFound)?;

        let seeker = self
            .seekers
            .find_by_user(&actor.user)?
            .ok_or(ApplicationServiceError::Forbidden)?;
        if application.job_seeker != seeker.id {
            return Err(ApplicationServiceError::Forbidden);
        }

        let prior = application.withdraw(note, actor.user.clone(), Utc::now())?;
        self.applications.update(application.clone())?;

        // Walking away from an offer undoes the hire the offer counted.
        if prior == ApplicationStatus::Offered {
            if let Err(err) = self.stats.remove_hire(&application.employer) {
                warn!(%err, employer = %application.employer, "failed to settle hire counter");
            }
        }

        Ok(application)
    }

    /// Employer/admin status progression with hire-counter symmetry and
    /// seeker notification fan-out.
    pub fn update_status(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        status: ApplicationStatus,
        note: Option<String>,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationServiceError::NotFound)?;
        self.authorize_application_manager(actor, &application)?;

        let old_status = application.transition(status, note, actor.user.clone(), Utc::now());
        self.applications.update(application.clone())?;

        if status == ApplicationStatus::Offered && old_status != ApplicationStatus::Offered {
            if let Err(err) = self.stats.record_hire(&application.employer) {
                warn!(%err, employer = %application.employer, "failed to settle hire counter");
            }
        } else if old_status == ApplicationStatus::Offered && status != ApplicationStatus::Offered {
            if let Err(err) = self.stats.remove_hire(&application.employer) {
                warn!(%err, employer = %application.employer, "failed to settle hire counter");
            }
        }

        self.notify_status_change(&application, old_status);
        if matches!(
            status,
            ApplicationStatus::Interview | ApplicationStatus::Offered
        ) {
            self.email_seeker_status(&application);
        }

        Ok(application)
    }

    /// Employer/admin rating of a candidate, 1 through 5. Leaves no history
    /// entry; nudges the seeker by email while they are in play.
    pub fn set_rating(
        &self,
        actor: &Actor,
        id: &ApplicationId,
        rating: i64,
    ) -> Result<Application, ApplicationServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ApplicationServiceError::Validation(vec![FieldError::new(
                "rating",
                "Rating must be between 1 and 5",
            )]));
        }

        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationServiceError::NotFound)?;
        self.authorize_application_manager(actor, &application)?;

        application.rating = Some(rating as u8);
        self.applications.update(application.clone())?;

        if matches!(
            application.status,
            ApplicationStatus::Interview | ApplicationStatus::Offered
        ) {
            self.email_seeker_status(&application);
        }

        Ok(application)
    }

    /// Fetch one application, visible to admins and both owners. The first
    /// view by the owning employer flips the viewed flag best-effort.
    pub fn fetch(
        &self,
        actor: &Actor,
        id: &ApplicationId,
    ) -> Result<Application, ApplicationServiceError> {
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(ApplicationServiceError::NotFound)?;

        if actor.is_admin() {
            return Ok(application);
        }

        if let Some(seeker) = self.seekers.find_by_user(&actor.user)? {
            if seeker.id == application.job_seeker {
                return Ok(application);
            }
        }

        if let Some(employer) = self.employers.find_by_user(&actor.user)? {
            if employer.id == application.employer {
                if application.record_view_by_employer() {
                    if let Err(err) = self.applications.update(application.clone()) {
                        warn!(%err, application = %application.id, "failed to persist viewed flag");
                    }
                }
                return Ok(application);
            }
        }

        Err(ApplicationServiceError::Forbidden)
    }

    /// The calling seeker's applications, newest first.
    pub fn list_for_seeker(
        &self,
        actor: &Actor,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let seeker = self
            .seekers
            .find_by_user(&actor.user)?
            .ok_or(ApplicationServiceError::SeekerProfileMissing)?;
        let mut applications = self.applications.list_for_seeker(&seeker.id)?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(applications)
    }

    /// Applications for one job, restricted to the job's owning employer.
    pub fn list_for_job(
        &self,
        actor: &Actor,
        job_id: &JobId,
    ) -> Result<Vec<Application>, ApplicationServiceError> {
        let employer = self
            .employers
            .find_by_user(&actor.user)?
            .ok_or(ApplicationServiceError::Forbidden)?;
        let job = self
            .jobs
            .fetch(job_id)?
            .ok_or(ApplicationServiceError::NotFound)?;
        if job.employer != employer.id {
            return Err(ApplicationServiceError::Forbidden);
        }

        let mut applications = self.applications.list_for_job(job_id)?;
        applications.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(applications)
    }

    fn authorize_application_manager(
        &self,
        actor: &Actor,
        application: &Application,
    ) -> Result<(), ApplicationServiceError> {
        if actor.is_admin() {
            return Ok(());
        }
        if actor.role != Role::Employer {
            return Err(ApplicationServiceError::Forbidden);
        }
        let employer = self
            .employers
            .find_by_user(&actor.user)?
            .ok_or(ApplicationServiceError::Forbidden)?;
        if employer.id != application.employer {
            return Err(ApplicationServiceError::Forbidden);
        }
        Ok(())
    }

    /// Counter bumps, seeker notification, and both emails for a landed
    /// submission. Nothing here can fail the submission itself.
    fn settle_submission_side_effects(
        &self,
        job: &Job,
        seeker: &SeekerProfile,
        employer: &EmployerProfile,
        application: &Application,
    ) {
        let mut counted = job.clone();
        counted.stats.applications += 1;
        if let Err(err) = self.jobs.update(counted) {
            warn!(%err, job = %job.id, "failed to bump job application counter");
        }
        if let Err(err) = self.stats.record_application(&employer.id) {
            warn!(%err, employer = %employer.id, "failed to bump employer application counter");
        }

        let mut message = format!(
            "Your application to {} at {} was received.",
            job.title, job.organization_name
        );
        if application.apply_attempts >= MAX_APPLY_ATTEMPTS {
            message.push(' ');
            message.push_str(FINAL_ATTEMPT_WARNING);
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("applicationId".to_string(), application.id.0.clone());
        metadata.insert("jobId".to_string(), job.id.0.clone());
        metadata.insert(
            "attempt".to_string(),
            application.apply_attempts.to_string(),
        );

        let draft = NotificationDraft {
            user: seeker.user.clone(),
            role: Role::Seeker,
            kind: NotificationKind::ApplicationSubmitted,
            title: format!("Application submitted: {}", job.title),
            message,
            cta_path: Some("/dashboard/jobseeker/applications".to_string()),
            cta_label: Some("View Application".to_string()),
            metadata,
            dedupe_key: Some(DedupeKey::new(
                NotificationKind::ApplicationSubmitted,
                application.id.0.clone(),
                application.applied_at,
            )),
        };
        if let Err(err) = self.notifier.emit(draft) {
            warn!(%err, application = %application.id, "failed to store submission notification");
        }

        if employer.settings.email_notifications.new_application {
            self.send_email(
                &employer.contact.email,
                &employer.contact.name,
                EmailTemplate::ApplicationReceived {
                    job_title: job.title.clone(),
                    candidate_name: seeker.full_name.clone(),
                    candidate_email: seeker.email.clone(),
                },
            );
        }

        self.send_email(
            &seeker.email,
            &seeker.full_name,
            EmailTemplate::ApplicationSubmitted {
                job_title: job.title.clone(),
                organization_name: job.organization_name.clone(),
            },
        );
    }

    /// One deduplicated in-app notification per status transition; repeated
    /// deliveries of the same transition collapse onto the stored record.
    fn notify_status_change(&self, application: &Application, old_status: ApplicationStatus) {
        let seeker = match self.seekers.fetch(&application.job_seeker) {
            Ok(Some(seeker)) => seeker,
            Ok(None) => {
                warn!(application = %application.id, "seeker profile missing for status notification");
                return;
            }
            Err(err) => {
                warn!(%err, application = %application.id, "failed to load seeker for notification");
                return;
            }
        };

        let (job_title, organization_name) = self.job_labels(application);
        let occurred_at = application
            .updated_at_manual
            .unwrap_or(application.applied_at);

        let mut metadata = BTreeMap::new();
        metadata.insert("applicationId".to_string(), application.id.0.clone());
        metadata.insert(
            "status".to_string(),
            application.status.label().to_string(),
        );
        metadata.insert("oldStatus".to_string(), old_status.label().to_string());
        metadata.insert("jobTitle".to_string(), job_title.clone());
        metadata.insert("companyName".to_string(), organization_name.clone());

        let draft = NotificationDraft {
            user: seeker.user.clone(),
            role: Role::Seeker,
            kind: NotificationKind::ApplicationStatus,
            title: format!(
                "Application status updated: {}",
                application.status.label()
            ),
            message: format!(
                "Your application moved from {} to {} for {} at {}.",
                old_status.label(),
                application.status.label(),
                job_title,
                organization_name
            ),
            cta_path: Some("/dashboard/jobseeker/applications".to_string()),
            cta_label: Some("View Application".to_string()),
            metadata,
            dedupe_key: Some(DedupeKey::new(
                NotificationKind::ApplicationStatus,
                application.id.0.clone(),
                occurred_at,
            )),
        };

        if let Err(err) = self.notifier.emit(draft) {
            warn!(%err, application = %application.id, "failed to store status notification");
        }
    }

    fn email_seeker_status(&self, application: &Application) {
        let seeker = match self.seekers.fetch(&application.job_seeker) {
            Ok(Some(seeker)) => seeker,
            _ => return,
        };
        let (job_title, organization_name) = self.job_labels(application);
        self.send_email(
            &seeker.email,
            &seeker.full_name,
            EmailTemplate::ApplicationStatusUpdate {
                job_title,
                organization_name,
                status: application.status,
            },
        );
    }

    fn job_labels(&self, application: &Application) -> (String, String) {
        match self.jobs.fetch(&application.job) {
            Ok(Some(job)) => (job.title, job.organization_name),
            _ => ("Your Application".to_string(), "the employer".to_string()),
        }
    }

    fn send_email(&self, to: &str, recipient_name: &str, template: EmailTemplate) {
        let message = EmailMessage {
            to: to.to_string(),
            recipient_name: recipient_name.to_string(),
            template,
        };
        if let Err(err) = self.mailer.send(message) {
            warn!(%err, recipient = to, "email dispatch failed");
        }
    }
}
