use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::Value;

use crate::board::applications::domain::{
    AnswerEntry, Application, ApplicationStatus, CoverLetter, ResumeAttachment, SubmissionIntake,
};
use crate::board::applications::service::ApplicationService;
use crate::board::email::{EmailError, EmailMessage, EmailNotifier, EmailTemplate};
use crate::board::employers::{ContactPerson, EmployerProfile, EmployerStatAggregator};
use crate::board::identity::{
    Actor, ApplicationId, EmployerId, JobId, NotificationId, Role, SeekerId, TokenVerifier, UserId,
};
use crate::board::jobs::{Job, JobStats, JobStatus};
use crate::board::notifications::{
    notification_router, DedupeKey, Notification, NotificationEmitter,
};
use crate::board::seekers::SeekerProfile;

pub(super) use crate::board::applications::repository::ApplicationRepository;
pub(super) use crate::board::employers::EmployerRepository;
pub(super) use crate::board::jobs::JobRepository;
pub(super) use crate::board::notifications::NotificationRepository;
pub(super) use crate::board::seekers::SeekerRepository;
use crate::board::storage::{ObjectStore, StorageError, StoredObject, UploadKind};
use crate::board::{application_router, BoardContext, RepositoryError};

pub(super) fn seeker_actor() -> Actor {
    Actor::new("user-seeker", Role::Seeker)
}

pub(super) fn employer_actor() -> Actor {
    Actor::new("user-employer", Role::Employer)
}

pub(super) fn admin_actor() -> Actor {
    Actor::new("user-admin", Role::Admin)
}

pub(super) fn employer_profile() -> EmployerProfile {
    EmployerProfile {
        id: EmployerId("emp-001".to_string()),
        user: UserId("user-employer".to_string()),
        organization_name: "Mercy General Hospital".to_string(),
        contact: ContactPerson {
            name: "Asha Pillai".to_string(),
            email: "hiring@mercygeneral.example".to_string(),
        },
        settings: Default::default(),
        stats: Default::default(),
    }
}

pub(super) fn seeker_profile() -> SeekerProfile {
    SeekerProfile {
        id: SeekerId("seek-001".to_string()),
        user: UserId("user-seeker".to_string()),
        full_name: "Maya Raman".to_string(),
        email: "maya.raman@example.com".to_string(),
        specialization: Some("Nursing".to_string()),
    }
}

pub(super) fn open_job() -> Job {
    Job {
        id: JobId("job-001".to_string()),
        employer: EmployerId("emp-001".to_string()),
        title: "ICU Staff Nurse".to_string(),
        organization_name: "Mercy General Hospital".to_string(),
        specialization: "Nursing".to_string(),
        job_type: "Full-time".to_string(),
        status: JobStatus::Active,
        posted_at: Utc::now(),
        expires_at: None,
        stats: JobStats::default(),
    }
}

pub(super) fn intake() -> SubmissionIntake {
    SubmissionIntake {
        resume: Some(ResumeAttachment {
            url: "https://assets.test/medhire/applications/user-seeker/0000000001".to_string(),
            filename: "maya-raman-resume.pdf".to_string(),
            public_id: Some("medhire/applications/user-seeker/0000000001".to_string()),
            bytes: Some(48_213),
            uploaded_at: Utc::now(),
        }),
        cover_letter: CoverLetter {
            text: Some("Eight years of ICU experience across two tertiary hospitals.".to_string()),
            file: None,
        },
        answers: vec![AnswerEntry {
            question_id: Some("q-shift".to_string()),
            question: "Are you available for night shifts?".to_string(),
            answer: "Yes".to_string(),
        }],
    }
}

#[derive(Default)]
pub(super) struct MemoryApplications {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        if guard
            .values()
            .any(|record| record.job == application.job && record.job_seeker == application.job_seeker)
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(application.id.clone(), application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_job_and_seeker(
        &self,
        job: &JobId,
        seeker: &SeekerId,
    ) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.job == job && &record.job_seeker == seeker)
            .cloned())
    }

    fn list_for_seeker(&self, seeker: &SeekerId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.job_seeker == seeker)
            .cloned()
            .collect())
    }

    fn list_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.job == job)
            .cloned()
            .collect())
    }

    fn count_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.employer == employer)
            .count() as u64)
    }

    fn count_for_employer_with_status(
        &self,
        employer: &EmployerId,
        status: ApplicationStatus,
    ) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.employer == employer && record.status == status)
            .count() as u64)
    }
}

#[derive(Default)]
pub(super) struct MemoryJobs {
    records: Mutex<HashMap<JobId, Job>>,
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn update(&self, job: Job) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(job.id.clone(), job);
        Ok(())
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn count_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|job| &job.employer == employer)
            .count() as u64)
    }

    fn count_active_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|job| &job.employer == employer && job.status == JobStatus::Active)
            .count() as u64)
    }
}

#[derive(Default)]
pub(super) struct MemorySeekers {
    records: Mutex<HashMap<SeekerId, SeekerProfile>>,
}

impl SeekerRepository for MemorySeekers {
    fn insert(&self, profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_user(&self, user: &UserId) -> Result<Option<SeekerProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().find(|profile| &profile.user == user).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryEmployers {
    records: Mutex<HashMap<EmployerId, EmployerProfile>>,
}

impl MemoryEmployers {
    pub(super) fn stats_of(&self, id: &EmployerId) -> crate::board::employers::EmployerStats {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard.get(id).expect("employer seeded").stats
    }
}

impl EmployerRepository for MemoryEmployers {
    fn insert(&self, profile: EmployerProfile) -> Result<EmployerProfile, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn update(&self, profile: EmployerProfile) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&profile.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(profile.id.clone(), profile);
        Ok(())
    }

    fn fetch(&self, id: &EmployerId) -> Result<Option<EmployerProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_user(&self, user: &UserId) -> Result<Option<EmployerProfile>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().find(|profile| &profile.user == user).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    records: Mutex<HashMap<NotificationId, Notification>>,
}

impl NotificationRepository for MemoryNotifications {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(key) = &notification.dedupe_key {
            if guard
                .values()
                .any(|record| record.user == notification.user && record.dedupe_key.as_ref() == Some(key))
            {
                return Err(RepositoryError::Conflict);
            }
        }
        guard.insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    fn update(&self, notification: Notification) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&notification.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(notification.id.clone(), notification);
        Ok(())
    }

    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_user_and_key(
        &self,
        user: &UserId,
        key: &DedupeKey,
    ) -> Result<Option<Notification>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| &record.user == user && record.dedupe_key.as_ref() == Some(key))
            .cloned())
    }

    fn list_for_user(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.user == user)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    pub(super) fn sent_to(&self, recipient: &str) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|message| message.to == recipient)
            .collect()
    }

    pub(super) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(super) fn status_updates(&self) -> Vec<EmailMessage> {
        self.sent()
            .into_iter()
            .filter(|message| {
                matches!(message.template, EmailTemplate::ApplicationStatusUpdate { .. })
            })
            .collect()
    }
}

impl EmailNotifier for RecordingMailer {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::Transport("smtp relay offline".to_string()));
        }
        self.sent.lock().expect("mailer mutex poisoned").push(message);
        Ok(())
    }
}

pub(super) struct StubObjectStore {
    sequence: AtomicU64,
}

impl Default for StubObjectStore {
    fn default() -> Self {
        Self {
            sequence: AtomicU64::new(1),
        }
    }
}

impl ObjectStore for StubObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        _kind: UploadKind,
    ) -> Result<StoredObject, StorageError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let public_id = format!("{folder}/{sequence:010}");
        Ok(StoredObject {
            url: format!("https://assets.test/{public_id}"),
            public_id,
            bytes: bytes.len() as u64,
        })
    }
}

pub(super) struct StaticTokens {
    tokens: HashMap<String, Actor>,
}

impl Default for StaticTokens {
    fn default() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert("seeker-token".to_string(), seeker_actor());
        tokens.insert("employer-token".to_string(), employer_actor());
        tokens.insert("admin-token".to_string(), admin_actor());
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokens {
    fn verify(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).cloned()
    }
}

pub(super) struct Harness {
    pub(super) service: ApplicationService,
    pub(super) applications: Arc<MemoryApplications>,
    pub(super) jobs: Arc<MemoryJobs>,
    pub(super) seekers: Arc<MemorySeekers>,
    pub(super) employers: Arc<MemoryEmployers>,
    pub(super) mailer: Arc<RecordingMailer>,
    pub(super) stats: EmployerStatAggregator,
    pub(super) emitter: NotificationEmitter,
}

/// Service wired to fresh in-memory stores, seeded with one employer, one
/// seeker, and one open job.
pub(super) fn harness() -> Harness {
    let applications = Arc::new(MemoryApplications::default());
    let jobs = Arc::new(MemoryJobs::default());
    let seekers = Arc::new(MemorySeekers::default());
    let employers = Arc::new(MemoryEmployers::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let mailer = Arc::new(RecordingMailer::default());

    employers
        .insert(employer_profile())
        .expect("employer seeds");
    seekers.insert(seeker_profile()).expect("seeker seeds");
    jobs.insert(open_job()).expect("job seeds");

    let stats = EmployerStatAggregator::new(
        employers.clone(),
        jobs.clone(),
        applications.clone(),
    );
    let emitter = NotificationEmitter::new(notifications.clone());

    let service = ApplicationService::new(
        applications.clone(),
        jobs.clone(),
        seekers.clone(),
        employers.clone(),
        stats.clone(),
        emitter.clone(),
        mailer.clone(),
    );

    Harness {
        service,
        applications,
        jobs,
        seekers,
        employers,
        mailer,
        stats,
        emitter,
    }
}

/// Router over a fresh harness, for oneshot tests.
pub(super) fn router_harness() -> (axum::Router, Arc<BoardContext>, Harness) {
    let harness = harness();

    let stats = harness.stats.clone();
    let emitter = harness.emitter.clone();
    let service = ApplicationService::new(
        harness.applications.clone(),
        harness.jobs.clone(),
        harness.seekers.clone(),
        harness.employers.clone(),
        stats,
        emitter.clone(),
        harness.mailer.clone(),
    );

    let ctx = Arc::new(BoardContext {
        applications: service,
        notifications: emitter,
        uploads: Arc::new(StubObjectStore::default()),
        tokens: Arc::new(StaticTokens::default()),
        upload_folder: "medhire/applications".to_string(),
    });

    let router = application_router(ctx.clone()).merge(notification_router(ctx.clone()));
    (router, ctx, harness)
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
