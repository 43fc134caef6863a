use std::sync::Arc;

use crate::board::applications::domain::ApplicationStatus;
use crate::board::applications::repository::ApplicationRepository;
use crate::board::identity::EmployerId;
use crate::board::jobs::JobRepository;
use crate::board::RepositoryError;

use super::{EmployerRepository, EmployerStats};

/// Sole owner of the employer counters. Each adjustment is an independent
/// read-modify-write save; callers treat failures as non-fatal and rely on
/// [`EmployerStatAggregator::resync`] to repair drift.
#[derive(Clone)]
pub struct EmployerStatAggregator {
    employers: Arc<dyn EmployerRepository>,
    jobs: Arc<dyn JobRepository>,
    applications: Arc<dyn ApplicationRepository>,
}

impl EmployerStatAggregator {
    pub fn new(
        employers: Arc<dyn EmployerRepository>,
        jobs: Arc<dyn JobRepository>,
        applications: Arc<dyn ApplicationRepository>,
    ) -> Self {
        Self {
            employers,
            jobs,
            applications,
        }
    }

    pub fn record_job_posted(&self, employer: &EmployerId) -> Result<(), RepositoryError> {
        self.adjust(employer, |stats| {
            stats.total_job_posts += 1;
            stats.active_job_posts += 1;
        })
    }

    pub fn record_job_closed(&self, employer: &EmployerId) -> Result<(), RepositoryError> {
        self.adjust(employer, |stats| stats.active_job_posts -= 1)
    }

    pub fn record_application(&self, employer: &EmployerId) -> Result<(), RepositoryError> {
        self.adjust(employer, |stats| stats.total_applications += 1)
    }

    pub fn record_hire(&self, employer: &EmployerId) -> Result<(), RepositoryError> {
        self.adjust(employer, |stats| stats.total_hires += 1)
    }

    pub fn remove_hire(&self, employer: &EmployerId) -> Result<(), RepositoryError> {
        self.adjust(employer, |stats| stats.total_hires -= 1)
    }

    fn adjust(
        &self,
        employer: &EmployerId,
        mutate: impl FnOnce(&mut EmployerStats),
    ) -> Result<(), RepositoryError> {
        let mut profile = self
            .employers
            .fetch(employer)?
            .ok_or(RepositoryError::NotFound)?;
        mutate(&mut profile.stats);
        self.employers.update(profile)
    }

    /// Recompute every counter from the live job and application documents.
    /// The correctness backstop for the best-effort increments above.
    pub fn resync(&self, employer: &EmployerId) -> Result<EmployerStats, RepositoryError> {
        let mut profile = self
            .employers
            .fetch(employer)?
            .ok_or(RepositoryError::NotFound)?;

        let recomputed = EmployerStats {
            total_job_posts: self.jobs.count_for_employer(employer)? as i64,
            active_job_posts: self.jobs.count_active_for_employer(employer)? as i64,
            total_applications: self.applications.count_for_employer(employer)? as i64,
            total_hires: self
                .applications
                .count_for_employer_with_status(employer, ApplicationStatus::Offered)?
                as i64,
        };

        profile.stats = recomputed;
        self.employers.update(profile)?;
        Ok(recomputed)
    }
}
