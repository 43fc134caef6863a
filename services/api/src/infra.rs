//! In-memory infrastructure adapters behind the library's storage, email,
//! upload, and token-verification traits, plus the seed data that makes a
//! fresh process usable immediately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use medhire::board::applications::{
    Application, ApplicationRepository, ApplicationService, ApplicationStatus,
};
use medhire::board::email::{EmailError, EmailMessage, EmailNotifier};
use medhire::board::employers::{
    ContactPerson, EmployerProfile, EmployerRepository, EmployerStatAggregator,
};
use medhire::board::identity::{
    Actor, ApplicationId, EmployerId, JobId, NotificationId, Role, SeekerId, TokenVerifier, UserId,
};
use medhire::board::jobs::{Job, JobRepository, JobService, JobStats, JobStatus};
use medhire::board::notifications::{
    DedupeKey, Notification, NotificationEmitter, NotificationRepository,
};
use medhire::board::seekers::{SeekerProfile, SeekerRepository};
use medhire::board::storage::{ObjectStore, StorageError, StoredObject, UploadKind};
use medhire::board::{BoardContext, RepositoryError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryApplicationRepository {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        // Composite unique index on (job, jobSeeker).
        if guard.values().any(|record| {
            record.job == application.job && record.job_seeker == application.job_seeker
        }) {
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
pub(crate) struct InMemoryJobRepository {
    records: Mutex<HashMap<JobId, Job>>,
}

impl JobRepository for InMemoryJobRepository {
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
pub(crate) struct InMemorySeekerRepository {
    records: Mutex<HashMap<SeekerId, SeekerProfile>>,
}

impl SeekerRepository for InMemorySeekerRepository {
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
pub(crate) struct InMemoryEmployerRepository {
    records: Mutex<HashMap<EmployerId, EmployerProfile>>,
}

impl InMemoryEmployerRepository {
    pub(crate) fn snapshot(&self, id: &EmployerId) -> Option<EmployerProfile> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        guard.get(id).cloned()
    }
}

impl EmployerRepository for InMemoryEmployerRepository {
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
pub(crate) struct InMemoryNotificationRepository {
    records: Mutex<HashMap<NotificationId, Notification>>,
}

impl NotificationRepository for InMemoryNotificationRepository {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if let Some(key) = &notification.dedupe_key {
            // Partial unique index on (user, dedupeKey).
            if guard.values().any(|record| {
                record.user == notification.user && record.dedupe_key.as_ref() == Some(key)
            }) {
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

/// Mailer that records outbound messages and logs them instead of talking
/// to a relay. Stands in for the external email collaborator.
#[derive(Default)]
pub(crate) struct OutboxMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl OutboxMailer {
    pub(crate) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }
}

impl EmailNotifier for OutboxMailer {
    fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(to = %message.to, subject = %message.template.subject(), "email queued");
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(())
    }
}

/// Object store that mints deterministic asset URLs without leaving the
/// process. Stands in for the external upload provider.
pub(crate) struct LocalObjectStore {
    base_url: &'static str,
    sequence: AtomicU64,
}

impl Default for LocalObjectStore {
    fn default() -> Self {
        Self {
            base_url: "https://assets.medhire.dev",
            sequence: AtomicU64::new(1),
        }
    }
}

impl ObjectStore for LocalObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        _kind: UploadKind,
    ) -> Result<StoredObject, StorageError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let public_id = format!("{folder}/{sequence:010}");
        Ok(StoredObject {
            url: format!("{}/{public_id}", self.base_url),
            public_id,
            bytes: bytes.len() as u64,
        })
    }
}

/// Token verification backed by a fixed token table; real signature checks
/// belong to the identity provider in front of this service.
pub(crate) struct StaticTokenVerifier {
    tokens: HashMap<String, Actor>,
}

impl StaticTokenVerifier {
    pub(crate) fn with_demo_tokens() -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(
            "seeker-token".to_string(),
            Actor::new("user-seeker", Role::Seeker),
        );
        tokens.insert(
            "employer-token".to_string(),
            Actor::new("user-employer", Role::Employer),
        );
        tokens.insert(
            "admin-token".to_string(),
            Actor::new("user-admin", Role::Admin),
        );
        Self { tokens }
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).cloned()
    }
}

/// Everything the server and demo need after wiring: the router context plus
/// direct handles for seeding, stats, and assertions.
pub(crate) struct Infra {
    pub(crate) context: Arc<BoardContext>,
    pub(crate) stats: EmployerStatAggregator,
    pub(crate) job_service: JobService,
    pub(crate) employers: Arc<InMemoryEmployerRepository>,
    pub(crate) mailer: Arc<OutboxMailer>,
    pub(crate) employer_id: EmployerId,
    pub(crate) job_id: JobId,
}

/// Build the full in-memory stack and seed one employer, one seeker, and
/// one open job so the demo tokens can exercise every endpoint.
pub(crate) fn bootstrap(upload_folder: &str) -> Infra {
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let jobs = Arc::new(InMemoryJobRepository::default());
    let seekers = Arc::new(InMemorySeekerRepository::default());
    let employers = Arc::new(InMemoryEmployerRepository::default());
    let notifications = Arc::new(InMemoryNotificationRepository::default());
    let mailer = Arc::new(OutboxMailer::default());

    let employer_id = EmployerId("emp-000001".to_string());
    employers
        .insert(EmployerProfile {
            id: employer_id.clone(),
            user: UserId("user-employer".to_string()),
            organization_name: "St. Martha Teaching Hospital".to_string(),
            contact: ContactPerson {
                name: "Farida Qureshi".to_string(),
                email: "recruiting@stmartha.example".to_string(),
            },
            settings: Default::default(),
            stats: Default::default(),
        })
        .expect("employer seeds");

    seekers
        .insert(SeekerProfile {
            id: SeekerId("seek-000001".to_string()),
            user: UserId("user-seeker".to_string()),
            full_name: "Maya Raman".to_string(),
            email: "maya.raman@example.com".to_string(),
            specialization: Some("Nursing".to_string()),
        })
        .expect("seeker seeds");

    let job_id = JobId("job-000001".to_string());
    jobs.insert(Job {
        id: job_id.clone(),
        employer: employer_id.clone(),
        title: "ICU Staff Nurse".to_string(),
        organization_name: "St. Martha Teaching Hospital".to_string(),
        specialization: "Nursing".to_string(),
        job_type: "Full-time".to_string(),
        status: JobStatus::Active,
        posted_at: Utc::now(),
        expires_at: None,
        stats: JobStats::default(),
    })
    .expect("job seeds");

    let stats = EmployerStatAggregator::new(
        employers.clone(),
        jobs.clone(),
        applications.clone(),
    );
    let emitter = NotificationEmitter::new(notifications.clone());
    let job_service = JobService::new(jobs.clone(), stats.clone());

    let service = ApplicationService::new(
        applications,
        jobs,
        seekers,
        employers.clone(),
        stats.clone(),
        emitter.clone(),
        mailer.clone(),
    );

    let context = Arc::new(BoardContext {
        applications: service,
        notifications: emitter,
        uploads: Arc::new(LocalObjectStore::default()),
        tokens: Arc::new(StaticTokenVerifier::with_demo_tokens()),
        upload_folder: upload_folder.to_string(),
    });

    Infra {
        context,
        stats,
        job_service,
        employers,
        mailer,
        employer_id,
        job_id,
    }
}
