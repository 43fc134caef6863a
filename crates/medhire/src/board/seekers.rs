use serde::{Deserialize, Serialize};

use crate::board::identity::{SeekerId, UserId};
use crate::board::RepositoryError;

/// Job-seeker profile, a separate document layered over the user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeekerProfile {
    pub id: SeekerId,
    pub user: UserId,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

pub trait SeekerRepository: Send + Sync {
    fn insert(&self, profile: SeekerProfile) -> Result<SeekerProfile, RepositoryError>;
    fn fetch(&self, id: &SeekerId) -> Result<Option<SeekerProfile>, RepositoryError>;
    fn find_by_user(&self, user: &UserId) -> Result<Option<SeekerProfile>, RepositoryError>;
}
