//! Response shaping.
//!
//! # Responsibilities
//! - Define the JSON bodies the browser form understands
//! - Map every failure to a status code and a structured body
//! - Cover the middleware failures (body limit, timeout) as well
//!
//! # Design Decisions
//! - Handlers return `Result<_, ApiError>`; nothing escapes as a bare error
//! - Provider diagnostics are attached only when the mode allows it
//! - Bodies never carry configuration values

use std::time::Duration;

use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::contact::Violation;
use crate::mail::DispatchError;

/// `{success:false, error, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }
}

/// `{success:true, message, messageId}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSuccess {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
}

impl SendSuccess {
    pub fn new(message_id: String) -> Self {
        Self {
            success: true,
            message: "email sent successfully",
            message_id,
        }
    }
}

/// `{status:"OK", timestamp, service}`.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: String,
}

/// Every way a request can fail.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    MethodNotAllowed,
    RateLimited { retry_after: Duration },
    PayloadTooLarge,
    UnreadableBody,
    Timeout,
    Invalid(Vec<Violation>),
    Dispatch { error: DispatchError, expose_detail: bool },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnreadableBody => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            ApiError::NotFound => ErrorBody::new("not found"),
            ApiError::MethodNotAllowed => ErrorBody::new("method not allowed"),
            ApiError::RateLimited { .. } => {
                ErrorBody::new("too many attempts, please try again later")
            }
            ApiError::PayloadTooLarge => ErrorBody::new("request body too large"),
            ApiError::UnreadableBody => ErrorBody::new("invalid request body"),
            ApiError::Timeout => ErrorBody::new("request timed out"),
            ApiError::Invalid(violations) => ErrorBody {
                details: Some(
                    violations
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .into(),
                ),
                ..ErrorBody::new("invalid data")
            },
            ApiError::Dispatch { error, expose_detail } => ErrorBody {
                details: expose_detail.then(|| error.detail().into()),
                ..ErrorBody::new(error.public_message())
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if let ApiError::RateLimited { retry_after } = self {
            // Round up so clients never retry a moment too early.
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::UnreadableBody
        }
    }
}

/// Give the bare 408 from the timeout layer a JSON body.
///
/// Responses that already carry a content type came from a handler and pass
/// through untouched.
pub async fn json_timeout(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        return ApiError::Timeout.into_response();
    }
    response
}
