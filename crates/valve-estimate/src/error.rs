use crate::attachments::AttachmentError;
use crate::config::ConfigError;
use crate::estimates::EstimateServiceError;
use crate::master::MasterDataError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    MasterData(MasterDataError),
    Estimate(EstimateServiceError),
    Attachment(AttachmentError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::MasterData(err) => write!(f, "master data error: {}", err),
            AppError::Estimate(err) => write!(f, "estimate error: {}", err),
            AppError::Attachment(err) => write!(f, "attachment error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::MasterData(err) => Some(err),
            AppError::Estimate(err) => Some(err),
            AppError::Attachment(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Domain failures keep the status mapping of their own routers.
        match self {
            AppError::MasterData(err) => crate::master::router::error_response(err),
            AppError::Estimate(err) => crate::estimates::router::error_response(err),
            AppError::Attachment(err) => crate::attachments::router::error_response(err),
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<MasterDataError> for AppError {
    fn from(value: MasterDataError) -> Self {
        Self::MasterData(value)
    }
}

impl From<EstimateServiceError> for AppError {
    fn from(value: EstimateServiceError) -> Self {
        Self::Estimate(value)
    }
}

impl From<AttachmentError> for AppError {
    fn from(value: AttachmentError) -> Self {
        Self::Attachment(value)
    }
}
