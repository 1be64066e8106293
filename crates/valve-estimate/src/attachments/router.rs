use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::AttachmentId;
use super::repository::AttachmentRepository;
use super::service::{AttachmentError, AttachmentService};
use super::store::AttachmentStore;
use crate::estimates::{EstimateNo, EstimateRepository};
use crate::repository::RepositoryError;

type SharedService<R, S, E> = Arc<AttachmentService<R, S, E>>;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    pub file_name: String,
}

/// Router builder for estimate attachments. Uploads are the raw request body.
pub fn attachment_router<R, S, E>(service: SharedService<R, S, E>) -> Router
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    let limit = service.max_bytes();
    Router::new()
        .route(
            "/api/v1/estimates/:estimate_no/attachments",
            get(list_handler::<R, S, E>).post(upload_handler::<R, S, E>),
        )
        .route(
            "/api/v1/attachments/:attachment_id",
            get(download_handler::<R, S, E>).delete(delete_handler::<R, S, E>),
        )
        .layer(DefaultBodyLimit::max(limit))
        .with_state(service)
}

pub fn error_response(err: AttachmentError) -> Response {
    let status = match &err {
        AttachmentError::EstimateNotFound(_)
        | AttachmentError::NotFound(_)
        | AttachmentError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AttachmentError::EmptyFileName | AttachmentError::EmptyPayload => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AttachmentError::TooLarge { .. } | AttachmentError::BodyLimitExceeded { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        AttachmentError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AttachmentError::Store(_) | AttachmentError::Repository(RepositoryError::Unavailable(_)) => {
            error!(error = %err, "attachment request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

pub(crate) async fn list_handler<R, S, E>(
    State(service): State<SharedService<R, S, E>>,
    Path(estimate_no): Path<String>,
) -> Response
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    match service.list(&EstimateNo(estimate_no)) {
        Ok(attachments) => (StatusCode::OK, Json(attachments)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn upload_handler<R, S, E>(
    State(service): State<SharedService<R, S, E>>,
    Path(estimate_no): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Result<Bytes, BytesRejection>,
) -> Response
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return error_response(AttachmentError::BodyLimitExceeded {
                limit: service.max_bytes(),
            });
        }
        Err(rejection) => {
            let status = rejection.status();
            return (status, Json(json!({ "error": rejection.body_text() }))).into_response();
        }
    };
    match service.upload(&EstimateNo(estimate_no), &query.file_name, &body) {
        Ok(attachment) => (StatusCode::CREATED, Json(attachment)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn download_handler<R, S, E>(
    State(service): State<SharedService<R, S, E>>,
    Path(attachment_id): Path<String>,
) -> Response
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    match service.download(&AttachmentId(attachment_id)) {
        Ok(content) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                header_safe(&content.attachment.file_name)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content.attachment.content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                content.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R, S, E>(
    State(service): State<SharedService<R, S, E>>,
    Path(attachment_id): Path<String>,
) -> Response
where
    R: AttachmentRepository + 'static,
    S: AttachmentStore + 'static,
    E: EstimateRepository + 'static,
{
    match service.delete(&AttachmentId(attachment_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

fn header_safe(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"') || c == ' ' { c } else { '_' })
        .collect()
}
