//! Uniform response envelope shared by every endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Field-level detail attached to validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Envelope every handler responds with: `{success, message, data?, errors?,
/// timestamp}`.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    pub timestamp: DateTime<Utc>,
}

pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let envelope = ApiEnvelope {
        success: true,
        message: message.to_string(),
        data: Some(data),
        errors: None,
        timestamp: Utc::now(),
    };
    (status, Json(envelope)).into_response()
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let envelope: ApiEnvelope<()> = ApiEnvelope {
        success: false,
        message: message.into(),
        data: None,
        errors: None,
        timestamp: Utc::now(),
    };
    (status, Json(envelope)).into_response()
}

pub fn validation_failure(message: impl Into<String>, errors: Vec<FieldError>) -> Response {
    let envelope: ApiEnvelope<()> = ApiEnvelope {
        success: false,
        message: message.into(),
        data: None,
        errors: Some(errors),
        timestamp: Utc::now(),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(envelope)).into_response()
}

pub fn unauthorized(message: &str) -> Response {
    failure(StatusCode::UNAUTHORIZED, message)
}
