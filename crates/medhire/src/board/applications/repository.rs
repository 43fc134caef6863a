use crate::board::identity::{ApplicationId, EmployerId, JobId, SeekerId};
use crate::board::RepositoryError;

use super::domain::{Application, ApplicationStatus};

/// Store contract for application documents.
///
/// `insert` enforces the composite uniqueness on (job, seeker): a second
/// document for the same pair must fail with [`RepositoryError::Conflict`],
/// which is also the only safety net when two concurrent submissions race.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn find_by_job_and_seeker(
        &self,
        job: &JobId,
        seeker: &SeekerId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn list_for_seeker(&self, seeker: &SeekerId) -> Result<Vec<Application>, RepositoryError>;
    fn list_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
    fn count_for_employer(&self, employer: &EmployerId) -> Result<u64, RepositoryError>;
    fn count_for_employer_with_status(
        &self,
        employer: &EmployerId,
        status: ApplicationStatus,
    ) -> Result<u64, RepositoryError>;
}
