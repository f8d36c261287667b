use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::image::ImageErrorCode;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A provider reply forwarded to the caller byte for byte.
#[derive(Debug, Clone)]
pub struct UpstreamPayload {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Upstream(UpstreamPayload),
    Unreachable(String),
    Timeout(String),
    UnexpectedShape(String),
    ImageProvider { code: ImageErrorCode, detail: String },
    Generation(String),
    InternalServerError(String),
}

impl fmt::Display for ApiError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            ApiError::Upstream(payload) => write!(f, "Upstream returned status {}", payload.status),
            ApiError::Unreachable(msg) => write!(f, "Upstream unreachable: {msg}"),
            ApiError::Timeout(msg) => write!(f, "Service unavailable: {msg}"),
            ApiError::UnexpectedShape(msg) => write!(f, "Unexpected upstream response: {msg}"),
            ApiError::ImageProvider { code, detail } => write!(f, "Image provider error ({code}): {detail}"),
            ApiError::Generation(msg) => write!(f, "Generation failed: {msg}"),
            ApiError::InternalServerError(msg) => write!(f, "Internal server error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status the caller receives for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Upstream(payload) => payload.status,
            ApiError::ImageProvider { code, .. } => code.status_code(),
            ApiError::Unreachable(_)
            | ApiError::Timeout(_)
            | ApiError::UnexpectedShape(_)
            | ApiError::Generation(_)
            | ApiError::InternalServerError(_) => 500,
        }
    }

    /// JSON body for every error except upstream passthrough, which keeps the provider's bytes.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        let (error, message) = match self {
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg.clone()),
            ApiError::Upstream(payload) => (
                "UPSTREAM_ERROR",
                format!("Upstream returned status {}", payload.status),
            ),
            ApiError::Unreachable(msg) => (
                "UPSTREAM_UNREACHABLE",
                format!("Could not reach the upstream service: {msg}"),
            ),
            ApiError::Timeout(msg) => ("SERVICE_UNAVAILABLE", msg.clone()),
            ApiError::UnexpectedShape(msg) => ("UNEXPECTED_RESPONSE", msg.clone()),
            ApiError::ImageProvider { code, detail } => (code.label(), code.user_message(detail)),
            ApiError::Generation(msg) => ("GENERATION_FAILED", msg.clone()),
            ApiError::InternalServerError(msg) => ("INTERNAL_ERROR", msg.clone()),
        };

        ErrorResponse {
            error: error.to_string(),
            message: Some(message),
        }
    }
}

#[cfg(feature = "server")]
impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::from_u16(ApiError::status_code(self))
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        if let ApiError::Upstream(payload) = self {
            return payload.to_http_response();
        }

        actix_web::HttpResponse::build(actix_web::ResponseError::status_code(self)).json(self.to_error_response())
    }
}

#[cfg(feature = "server")]
impl UpstreamPayload {
    #[must_use]
    pub fn to_http_response(&self) -> actix_web::HttpResponse {
        let status = actix_web::http::StatusCode::from_u16(self.status)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = actix_web::HttpResponse::build(status);
        if let Some(content_type) = &self.content_type {
            builder.content_type(content_type.as_str());
        }
        builder.body(self.body.clone())
    }
}

// Transport failures never carry a provider verdict, so they are classified
// as timeout or connectivity only.
impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout("The upstream service did not respond in time".to_string())
        } else {
            ApiError::Unreachable(err.to_string())
        }
    }
}

impl From<genai::Error> for ApiError {
    fn from(err: genai::Error) -> Self {
        ApiError::Generation(err.to_string())
    }
}

impl ApiError {
    pub fn internal_server_error(msg: impl Into<String>) -> Self {
        ApiError::InternalServerError(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn unexpected_shape(msg: impl Into<String>) -> Self {
        ApiError::UnexpectedShape(msg.into())
    }
}
