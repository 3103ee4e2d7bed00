use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::extract::ExtractError;
use crate::matcher::MatcherError;

/// Message returned when a submission carries no `cv` file.
pub const MISSING_FILE_MESSAGE: &str = "File path missing";

/// Message returned for every failure inside the pipeline.
pub const SERVER_ERROR_MESSAGE: &str = "Server error";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Responses never carry the internal detail. Each one gets a fresh
/// correlation id which is logged next to the detail instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed multipart body: {detail}")]
    MultipartParse { status: StatusCode, detail: String },

    #[error("No cv file in submission")]
    MissingFile,

    #[error("Upload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    #[error("Matcher call failed: {0}")]
    UpstreamCall(String),

    #[error("Matcher timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Retention error: {0}")]
    Retention(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MultipartParse { .. } => "MULTIPART_ERROR",
            AppError::MissingFile => "MISSING_FILE",
            AppError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            AppError::TextExtraction(_) => "TEXT_EXTRACTION_ERROR",
            AppError::UpstreamCall(_) => "UPSTREAM_ERROR",
            AppError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Retention(_) => "RETENTION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Only a missing file and an oversized body are the client's fault;
    /// everything else that goes wrong in the pipeline is a 500.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::MultipartParse { status, .. } => *status,
            AppError::TextExtraction(_)
            | AppError::UpstreamCall(_)
            | AppError::UpstreamTimeout(_)
            | AppError::Database(_)
            | AppError::Storage(_)
            | AppError::Retention(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::BAD_REQUEST => MISSING_FILE_MESSAGE,
            StatusCode::PAYLOAD_TOO_LARGE => "Payload too large",
            _ => SERVER_ERROR_MESSAGE,
        }
    }
}

impl From<MultipartError> for AppError {
    /// Keeps the 413 axum reports for a body over the limit. Any other
    /// decoding failure is a server error.
    fn from(e: MultipartError) -> Self {
        let status = match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::MultipartParse {
            status,
            detail: e.body_text(),
        }
    }
}

impl From<ExtractError> for AppError {
    fn from(e: ExtractError) -> Self {
        AppError::TextExtraction(e.to_string())
    }
}

impl From<MatcherError> for AppError {
    fn from(e: MatcherError) -> Self {
        match e {
            MatcherError::Timeout { .. } => AppError::UpstreamTimeout(e.to_string()),
            other => AppError::UpstreamCall(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let correlation_id = Uuid::new_v4();

        if status.is_server_error() {
            tracing::error!(%correlation_id, code, "{}", self);
        } else {
            tracing::warn!(%correlation_id, code, "{}", self);
        }

        // The missing-file reply is a fixed body clients match on.
        let body = match self {
            AppError::MissingFile => json!({ "error": MISSING_FILE_MESSAGE }),
            _ => json!({
                "error": self.public_message(),
                "code": code,
                "correlation_id": correlation_id,
            }),
        };

        (status, Json(body)).into_response()
    }
}
