//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use estate_render::RenderError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for every failed render.
pub const RENDER_FAILED: &str = "Rendering nie powiódł się";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Render failed: {details}")]
    RenderFailed { details: String },

    #[error("Render timed out: {details}")]
    RenderTimeout { details: String },

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::RenderFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::RenderTimeout { .. } | ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Io(_))
    }

    fn into_body(self) -> ErrorResponse {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Upstream(msg)
            | ApiError::UpstreamTimeout(msg)
            | ApiError::Unavailable(msg) => ErrorResponse::new(msg),
            ApiError::RenderFailed { details } | ApiError::RenderTimeout { details } => ErrorResponse {
                error: RENDER_FAILED.to_string(),
                details: Some(details),
            },
            other => ErrorResponse::new(other.to_string()),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Validation(msg) => ApiError::BadRequest(msg),
            RenderError::Timeout(_) => ApiError::RenderTimeout {
                details: err.details(),
            },
            RenderError::ToolFailed { .. } | RenderError::ToolNotFound(_) => ApiError::RenderFailed {
                details: err.details(),
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Nieprawidłowe dane JSON: {}", rejection.body_text()))
    }
}

#[cfg(feature = "scrape")]
impl From<estate_scrape::ScrapeError> for ApiError {
    fn from(err: estate_scrape::ScrapeError) -> Self {
        use estate_scrape::ScrapeError;
        match err {
            ScrapeError::Timeout(_) => ApiError::UpstreamTimeout(err.to_string()),
            ScrapeError::Client(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::Upstream(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorResponse {
    fn new(error: String) -> Self {
        Self { error, details: None }
    }
}

/// Whether `ENVIRONMENT` names a production deployment.
fn is_production() -> bool {
    names_production(std::env::var("ENVIRONMENT").ok().as_deref())
}

fn names_production(environment: Option<&str>) -> bool {
    environment.is_some_and(|v| v.trim().eq_ignore_ascii_case("production"))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let body = if self.is_internal() && is_production() {
            ErrorResponse::new("An internal error occurred".to_string())
        } else {
            self.into_body()
        };

        (status, Json(body)).into_response()
    }
}
