pub mod emitter;
pub mod router;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::identity::{NotificationId, Role, UserId};
use crate::board::RepositoryError;

pub use emitter::NotificationEmitter;
pub use router::notification_router;

/// Logical event class a notification reports. Doubles as the event-kind
/// component of [`DedupeKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationSubmitted,
    ApplicationStatus,
    System,
}

impl NotificationKind {
    pub const fn slug(self) -> &'static str {
        match self {
            NotificationKind::ApplicationSubmitted => "application_submitted",
            NotificationKind::ApplicationStatus => "application_status",
            NotificationKind::System => "system",
        }
    }
}

/// Structured idempotency key: (event kind, subject id, logical timestamp).
/// Guarantees at-most-one stored notification per logical event occurrence
/// without the collision hazards of hand-formatted strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupeKey {
    pub kind: NotificationKind,
    pub subject: String,
    pub occurred_at: DateTime<Utc>,
}

impl DedupeKey {
    pub fn new(kind: NotificationKind, subject: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            occurred_at,
        }
    }
}

impl fmt::Display for DedupeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.kind.slug(),
            self.subject,
            self.occurred_at.timestamp()
        )
    }
}

/// User-scoped notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    pub user: UserId,
    pub role: Role,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cta_label: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<DedupeKey>,
}

/// Everything a caller supplies to emit a notification; the emitter mints
/// the identifier and creation timestamp.
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub user: UserId,
    pub role: Role,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub cta_path: Option<String>,
    pub cta_label: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub dedupe_key: Option<DedupeKey>,
}

/// Store contract: uniqueness on (user, dedupe key) is the repository's
/// responsibility, exactly like the partial unique index in the document
/// database.
pub trait NotificationRepository: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn update(&self, notification: Notification) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;
    fn find_by_user_and_key(
        &self,
        user: &UserId,
        key: &DedupeKey,
    ) -> Result<Option<Notification>, RepositoryError>;
    fn list_for_user(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError>;
}
