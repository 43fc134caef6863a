pub mod stats;

use serde::{Deserialize, Serialize};

use crate::board::identity::{EmployerId, UserId};
use crate::board::RepositoryError;

pub use stats::EmployerStatAggregator;

/// Contact person surfaced to candidates and used for employer email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPerson {
    pub name: String,
    pub email: String,
}

/// Per-employer opt-outs for outbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotificationSettings {
    pub new_application: bool,
    pub application_update: bool,
}

impl Default for EmailNotificationSettings {
    fn default() -> Self {
        Self {
            new_application: true,
            application_update: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerSettings {
    pub email_notifications: EmailNotificationSettings,
}

/// Aggregate counters kept on the employer document. Signed so best-effort
/// decrements can drift below zero until a resync repairs them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerStats {
    pub total_job_posts: i64,
    pub active_job_posts: i64,
    pub total_applications: i64,
    pub total_hires: i64,
}

/// Employer (healthcare organization) profile layered over a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    pub id: EmployerId,
    pub user: UserId,
    pub organization_name: String,
    pub contact: ContactPerson,
    #[serde(default)]
    pub settings: EmployerSettings,
    #[serde(default)]
    pub stats: EmployerStats,
}

pub trait EmployerRepository: Send + Sync {
    fn insert(&self, profile: EmployerProfile) -> Result<EmployerProfile, RepositoryError>;
    fn update(&self, profile: EmployerProfile) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &EmployerId) -> Result<Option<EmployerProfile>, RepositoryError>;
    fn find_by_user(&self, user: &UserId) -> Result<Option<EmployerProfile>, RepositoryError>;
}
