use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::board::identity::{NotificationId, UserId};
use crate::board::RepositoryError;

use super::{Notification, NotificationDraft, NotificationRepository};

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Create-if-absent notification emission keyed on (user, dedupe key).
#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn NotificationRepository>,
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn NotificationRepository>) -> Self {
        Self { store }
    }

    /// Emit a notification. With a dedupe key present this is idempotent:
    /// a second call for the same (user, key) returns the stored record
    /// untouched. Without a key every call creates a new record.
    pub fn emit(&self, draft: NotificationDraft) -> Result<Notification, RepositoryError> {
        if let Some(key) = &draft.dedupe_key {
            if let Some(existing) = self.store.find_by_user_and_key(&draft.user, key)? {
                debug!(key = %key, "notification already stored for this event");
                return Ok(existing);
            }
        }

        let notification = Notification {
            id: next_notification_id(),
            user: draft.user.clone(),
            role: draft.role,
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            cta_path: draft.cta_path,
            cta_label: draft.cta_label,
            metadata: draft.metadata,
            read_at: None,
            created_at: Utc::now(),
            dedupe_key: draft.dedupe_key.clone(),
        };

        match self.store.insert(notification) {
            Ok(stored) => Ok(stored),
            // A concurrent emit for the same key won the insert; surface its
            // record so retries stay idempotent.
            Err(RepositoryError::Conflict) => {
                if let Some(key) = &draft.dedupe_key {
                    if let Some(existing) = self.store.find_by_user_and_key(&draft.user, key)? {
                        return Ok(existing);
                    }
                }
                Err(RepositoryError::Conflict)
            }
            Err(err) => Err(err),
        }
    }

    /// Notifications for one user, newest first.
    pub fn list_for_user(&self, user: &UserId) -> Result<Vec<Notification>, RepositoryError> {
        let mut notifications = self.store.list_for_user(user)?;
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    /// Mark one of the user's notifications read. Records owned by other
    /// users are reported as missing rather than forbidden.
    pub fn mark_read(
        &self,
        user: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, RepositoryError> {
        let mut notification = self.store.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        if &notification.user != user {
            return Err(RepositoryError::NotFound);
        }

        if notification.read_at.is_none() {
            notification.read_at = Some(Utc::now());
            self.store.update(notification.clone())?;
        }

        Ok(notification)
    }
}
