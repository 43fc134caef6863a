use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::board::identity::{Actor, ApplicationId, JobId};
use crate::board::response::{self, FieldError};
use crate::board::storage::UploadKind;
use crate::board::{authenticate, BoardContext};

use super::domain::{
    AnswerEntry, Application, ApplicationStatus, CoverLetter, CoverLetterFile, ResumeAttachment,
    SubmissionIntake,
};
use super::service::{ApplicationServiceError, ErrorKind};

const APPLY_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// HTTP surface of the application lifecycle engine.
pub fn application_router(ctx: Arc<BoardContext>) -> Router {
    Router::new()
        .route("/api/v1/jobs/:job_id/apply", post(apply_handler))
        .route("/api/v1/applications/me", get(my_applications_handler))
        .route(
            "/api/v1/applications/job/:job_id",
            get(job_applications_handler),
        )
        .route("/api/v1/applications/:id", get(fetch_handler))
        .route(
            "/api/v1/applications/:id/status",
            patch(update_status_handler),
        )
        .route(
            "/api/v1/applications/:id/withdraw",
            patch(withdraw_handler),
        )
        .route("/api/v1/applications/:id/rating", patch(set_rating_handler))
        .with_state(ctx)
}

fn service_error(err: ApplicationServiceError) -> Response {
    match err {
        ApplicationServiceError::Validation(errors) => {
            response::validation_failure("Validation failed", errors)
        }
        err => {
            let status = match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Forbidden => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            };

            // Storage-layer detail stays out of response bodies.
            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                "Internal server error".to_string()
            } else {
                err.to_string()
            };

            response::failure(status, message)
        }
    }
}

#[derive(Debug, Serialize)]
struct ApplicationView {
    application: Application,
}

#[derive(Debug, Serialize)]
struct ApplicationList {
    applications: Vec<Application>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplyBody {
    #[serde(default)]
    cover_letter: Option<CoverLetterField>,
    #[serde(default)]
    answers: Vec<AnswerEntry>,
}

/// The cover letter arrives either as a bare string or an object; both
/// normalize to [`CoverLetter`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoverLetterField {
    Text(String),
    Structured {
        #[serde(default)]
        text: Option<String>,
    },
}

impl CoverLetterField {
    fn into_cover_letter(self) -> CoverLetter {
        match self {
            CoverLetterField::Text(text) => CoverLetter {
                text: Some(text),
                file: None,
            },
            CoverLetterField::Structured { text } => CoverLetter { text, file: None },
        }
    }
}

pub(crate) async fn apply_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(job_id): Path<String>,
    request: Request,
) -> Response {
    let actor = match authenticate(&ctx, request.headers()) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let intake = if is_multipart {
        let multipart = match Multipart::from_request(request, &()).await {
            Ok(multipart) => multipart,
            Err(_) => {
                return response::failure(StatusCode::BAD_REQUEST, "Malformed multipart body")
            }
        };
        match read_multipart_intake(&ctx, &actor, multipart).await {
            Ok(intake) => intake,
            Err(response) => return response,
        }
    } else {
        let bytes = match to_bytes(request.into_body(), APPLY_BODY_LIMIT).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return response::failure(StatusCode::BAD_REQUEST, "Unreadable request body")
            }
        };
        if bytes.is_empty() {
            SubmissionIntake::default()
        } else {
            match serde_json::from_slice::<ApplyBody>(&bytes) {
                Ok(body) => SubmissionIntake {
                    resume: None,
                    cover_letter: body
                        .cover_letter
                        .map(CoverLetterField::into_cover_letter)
                        .unwrap_or_default(),
                    answers: body.answers,
                },
                Err(err) => {
                    return response::validation_failure(
                        "Malformed application payload",
                        vec![FieldError::new("body", err.to_string())],
                    )
                }
            }
        }
    };

    match ctx.applications.submit(&actor, &JobId(job_id), intake) {
        Ok(receipt) => response::success(StatusCode::CREATED, "Application submitted", receipt),
        Err(err) => service_error(err),
    }
}

/// Drain the multipart stream, passing file parts through the object store
/// and collecting text parts into the intake.
async fn read_multipart_intake(
    ctx: &BoardContext,
    actor: &Actor,
    mut multipart: Multipart,
) -> Result<SubmissionIntake, Response> {
    let folder = format!("{}/{}", ctx.upload_folder, actor.user);
    let mut intake = SubmissionIntake::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => {
                return Err(response::failure(
                    StatusCode::BAD_REQUEST,
                    "Malformed multipart body",
                ))
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let filename = field.file_name().unwrap_or("resume").to_string();
                let bytes = field.bytes().await.map_err(|_| {
                    response::failure(StatusCode::BAD_REQUEST, "Unreadable resume upload")
                })?;
                let stored = ctx
                    .uploads
                    .upload(&bytes, &folder, UploadKind::Document)
                    .map_err(|_| {
                        response::failure(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Failed to store resume attachment",
                        )
                    })?;
                intake.resume = Some(ResumeAttachment::from_upload(stored, filename, Utc::now()));
            }
            "coverLetterFile" => {
                let filename = field.file_name().unwrap_or("cover-letter").to_string();
                let bytes = field.bytes().await.map_err(|_| {
                    response::failure(StatusCode::BAD_REQUEST, "Unreadable cover letter upload")
                })?;
                let stored = ctx
                    .uploads
                    .upload(&bytes, &folder, UploadKind::Document)
                    .map_err(|_| {
                        response::failure(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Failed to store cover letter attachment",
                        )
                    })?;
                intake.cover_letter.file = Some(CoverLetterFile {
                    url: stored.url,
                    filename,
                    public_id: Some(stored.public_id),
                    bytes: Some(stored.bytes),
                });
            }
            "coverLetter" => {
                let text = field.text().await.map_err(|_| {
                    response::failure(StatusCode::BAD_REQUEST, "Unreadable cover letter text")
                })?;
                if !text.trim().is_empty() {
                    intake.cover_letter.text = Some(text);
                }
            }
            "answers" => {
                let raw = field.text().await.map_err(|_| {
                    response::failure(StatusCode::BAD_REQUEST, "Unreadable answers payload")
                })?;
                intake.answers = serde_json::from_str(&raw).unwrap_or_default();
            }
            _ => {}
        }
    }

    Ok(intake)
}

pub(crate) async fn my_applications_handler(
    State(ctx): State<Arc<BoardContext>>,
    headers: HeaderMap,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match ctx.applications.list_for_seeker(&actor) {
        Ok(applications) => response::success(
            StatusCode::OK,
            "Applications fetched",
            ApplicationList { applications },
        ),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn job_applications_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match ctx.applications.list_for_job(&actor, &JobId(job_id)) {
        Ok(applications) => response::success(
            StatusCode::OK,
            "Applications fetched",
            ApplicationList { applications },
        ),
        Err(err) => service_error(err),
    }
}

pub(crate) async fn fetch_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match ctx.applications.fetch(&actor, &ApplicationId(id)) {
        Ok(application) => response::success(
            StatusCode::OK,
            "Application fetched",
            ApplicationView { application },
        ),
        Err(err) => service_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateStatusBody {
    status: String,
    #[serde(default)]
    note: Option<String>,
}

pub(crate) async fn update_status_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<UpdateStatusBody>>,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let Some(Json(body)) = body else {
        return response::validation_failure(
            "Validation failed",
            vec![FieldError::new("status", "Status is required")],
        );
    };

    let Some(status) = ApplicationStatus::parse(&body.status) else {
        return response::validation_failure(
            "Validation failed",
            vec![FieldError::new(
                "status",
                format!("Unknown status '{}'", body.status),
            )],
        );
    };

    match ctx
        .applications
        .update_status(&actor, &ApplicationId(id), status, body.note)
    {
        Ok(application) => response::success(
            StatusCode::OK,
            "Application status updated",
            ApplicationView { application },
        ),
        Err(err) => service_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct WithdrawBody {
    #[serde(default)]
    note: Option<String>,
}

pub(crate) async fn withdraw_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<WithdrawBody>>,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let note = body.and_then(|Json(body)| body.note);

    match ctx.applications.withdraw(&actor, &ApplicationId(id), note) {
        Ok(application) => response::success(
            StatusCode::OK,
            "Application withdrawn",
            ApplicationView { application },
        ),
        Err(err) => service_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct RatingBody {
    #[serde(default)]
    rating: Option<i64>,
}

pub(crate) async fn set_rating_handler(
    State(ctx): State<Arc<BoardContext>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<RatingBody>>,
) -> Response {
    let actor = match authenticate(&ctx, &headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let Some(rating) = body.and_then(|Json(body)| body.rating) else {
        return response::validation_failure(
            "Validation failed",
            vec![FieldError::new("rating", "Rating must be between 1 and 5")],
        );
    };

    match ctx
        .applications
        .set_rating(&actor, &ApplicationId(id), rating)
    {
        Ok(application) => response::success(
            StatusCode::OK,
            "Rating updated",
            ApplicationView { application },
        ),
        Err(err) => service_error(err),
    }
}
