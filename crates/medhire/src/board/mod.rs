//! Job-board domain: entities, the application lifecycle engine, and the
//! HTTP surface exposed to the service crate.

pub mod applications;
pub mod email;
pub mod employers;
pub mod identity;
pub mod jobs;
pub mod notifications;
pub mod response;
pub mod seekers;
pub mod storage;

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum::response::Response;

use self::applications::ApplicationService;
use self::identity::{Actor, TokenVerifier};
use self::notifications::NotificationEmitter;
use self::storage::ObjectStore;

pub use self::applications::application_router;
pub use self::notifications::notification_router;

/// Error enumeration shared by every entity store.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("document already exists")]
    Conflict,
    #[error("document not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Shared state handed to the routers: the lifecycle engine plus the
/// collaborators the HTTP layer talks to directly.
pub struct BoardContext {
    pub applications: ApplicationService,
    pub notifications: NotificationEmitter,
    pub uploads: Arc<dyn ObjectStore>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub upload_folder: String,
}

/// Resolve the bearer token on a request to an [`Actor`], or produce the
/// 401 envelope the caller should return as-is.
pub(crate) fn authenticate(ctx: &BoardContext, headers: &HeaderMap) -> Result<Actor, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return Err(response::unauthorized("Authentication required"));
    };

    ctx.tokens
        .verify(token)
        .ok_or_else(|| response::unauthorized("Invalid or expired token"))
}
