use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::board::employers::stats::EmployerStatAggregator;
use crate::board::identity::{EmployerId, JobId};
use crate::board::RepositoryError;

/// Lifecycle of a job post. Only `Active` posts accept applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Active,
    Pending,
    Flagged,
    Archived,
    Closed,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            JobStatus::Active => "Active",
            JobStatus::Pending => "Pending",
            JobStatus::Flagged => "Flagged",
            JobStatus::Archived => "Archived",
            JobStatus::Closed => "Closed",
        }
    }
}

/// Running counters stored on the job document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    pub views: u64,
    pub applications: u64,
}

/// A job post. `organization_name` is a snapshot from the employer profile
/// so listings render without a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub employer: EmployerId,
    pub title: String,
    pub organization_name: String,
    pub specialization: String,
    pub job_type: String,
    pub status: JobStatus,
    pub posted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub stats: JobStats,
}

impl Job {
    /// A job accepts applications while Active and not past its expiry.
    pub fn is_open(&self) -> bool {
        if self.status != JobStatus::Active {
            return false;
        }
        match self.expires_at {
            Some(expiry) => expiry > Utc::now(),
            None => true,
        }
    }
}

pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn update(&self, job: Job) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn count_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError>;
    fn count_active_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError>;
}

/// Fields an employer supplies when posting a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: String,
    pub specialization: String,
    #[serde(default = "JobDraft::default_job_type")]
    pub job_type: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl JobDraft {
    fn default_job_type() -> String {
        "Full-time".to_string()
    }
}

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_job_id() -> JobId {
    let id = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    JobId(format!("job-{id:06}"))
}

/// Posting and closing of job documents, with employer counter upkeep.
pub struct JobService {
    jobs: Arc<dyn JobRepository>,
    stats: EmployerStatAggregator,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobRepository>, stats: EmployerStatAggregator) -> Self {
        Self { jobs, stats }
    }

    /// Mint an Active job for the employer. Counter updates are best-effort
    /// and never fail the post.
    pub fn post(
        &self,
        employer: &EmployerId,
        organization_name: &str,
        draft: JobDraft,
    ) -> Result<Job, RepositoryError> {
        let job = Job {
            id: next_job_id(),
            employer: employer.clone(),
            title: draft.title,
            organization_name: organization_name.to_string(),
            specialization: draft.specialization,
            job_type: draft.job_type,
            status: JobStatus::Active,
            posted_at: Utc::now(),
            expires_at: draft.expires_at,
            stats: JobStats::default(),
        };

        let job = self.jobs.insert(job)?;

        if let Err(err) = self.stats.record_job_posted(employer) {
            warn!(%err, employer = %employer, "failed to update employer job counters");
        }

        Ok(job)
    }

    /// Close an open job; the active-post counter is decremented best-effort.
    pub fn close(&self, id: &JobId) -> Result<Job, RepositoryError> {
        let mut job = self.jobs.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        if job.status == JobStatus::Closed {
            return Ok(job);
        }

        let was_active = job.status == JobStatus::Active;
        job.status = JobStatus::Closed;
        self.jobs.update(job.clone())?;

        if was_active {
            if let Err(err) = self.stats.record_job_closed(&job.employer) {
                warn!(%err, employer = %job.employer, "failed to update employer job counters");
            }
        }

        Ok(job)
    }
}
