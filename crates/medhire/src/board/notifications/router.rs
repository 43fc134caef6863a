use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, patch};
use axum::Router;
use serde::Serialize;

use crate::board::identity::NotificationId;
use crate::board::{authenticate, response, BoardContext, RepositoryError};

use super::Notification;

pub fn notification_router(ctx: Arc<BoardContext>) -> Router {
    Router::new()
        .route("/api/v1/notifications", get(list_handler))
        .route("/api/v1/notifications/:id/read", patch(mark_read_handler))
        .with_state(ctx)
}

#[derive(Debug, Serialize)]
struct NotificationList {
    notifications: Vec<Notification>,
}

pub(crate) async fn list_handler(
    State(ctx): State<Arc<BoardContext>>,
    headers: HeaderMap,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match ctx.notifications.list_for_user(&actor.user) {
        Ok(notifications) => response::success(
            StatusCode::OK,
            "Notifications fetched",
            NotificationList { notifications },
        ),
        Err(err) => response::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to fetch notifications: {err}"),
        ),
    }
}

#[derive(Debug, Serialize)]
struct NotificationView {
    notification: Notification,
}

pub(crate) async fn mark_read_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match ctx
        .notifications
        .mark_read(&actor.user, &NotificationId(id))
    {
        Ok(notification) => response::success(
            StatusCode::OK,
            "Notification marked read",
            NotificationView { notification },
        ),
        Err(RepositoryError::NotFound) => {
            response::failure(StatusCode::NOT_FOUND, "Notification not found")
        }
        Err(err) => response::failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to update notification: {err}"),
        ),
    }
}
