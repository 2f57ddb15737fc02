//! Error-to-response mapping at the handler boundary.
//!
//! Every failure leaving a handler becomes `{error, details}` JSON with a
//! status from the taxonomy: caller-input faults are 400, missing upstream
//! resources are 404, rate limiting is 429, everything else is 500. Nothing
//! crosses the response boundary unlogged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use compass_common::CompassError;
use compass_llm::traits::LlmError;
use compass_oauth::OAuthError;
use compass_social::SocialError;
use compass_store::StoreError;
use serde::Serialize;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    details: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            details: details.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, details)
    }

    pub fn not_found(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, details)
    }

    pub fn too_many_requests(details: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded", details)
    }

    pub fn internal(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, details)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(
            status = self.status.as_u16(),
            error = %self.error,
            details = %self.details,
            "request.failed"
        );
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SocialError> for ApiError {
    fn from(e: SocialError) -> Self {
        match e {
            SocialError::UserNotFound(name) => Self::not_found("user not found", name),
            SocialError::Http(inner) => Self::internal("upstream error", inner.to_string()),
        }
    }
}

impl From<CompassError> for ApiError {
    fn from(e: CompassError) -> Self {
        match e {
            CompassError::Validation(details) => Self::bad_request("invalid request", details),
            CompassError::State(details) => Self::bad_request("state error", details),
            CompassError::NotFound(details) => Self::not_found("not found", details),
            other => Self::internal("analysis failed", other.to_string()),
        }
    }
}

impl From<OAuthError> for ApiError {
    fn from(e: OAuthError) -> Self {
        match &e {
            OAuthError::MissingParams | OAuthError::UnknownState => {
                Self::bad_request("oauth error", e.to_string())
            }
            OAuthError::NoTokens | OAuthError::NoRefreshToken => {
                Self::bad_request("oauth error", e.to_string())
            }
            _ => Self::internal("oauth error", e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::internal("store error", e.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        Self::internal("provider error", e.to_string())
    }
}
